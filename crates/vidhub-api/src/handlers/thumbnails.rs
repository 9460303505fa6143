use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use vidhub_core::models::{ReconcileReport, Video};

/// Retry thumbnail retrieval for every video that still lacks one.
///
/// Per-video failures are listed in the report; only a failure to query the
/// store fails the request.
#[utoipa::path(
    post,
    path = "/api/v0/thumbnails/reconcile",
    tag = "thumbnails",
    responses(
        (status = 200, description = "Sweep finished", body = ReconcileReport),
        (status = 500, description = "Could not list videos", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "reconcile_thumbnails"))]
pub async fn reconcile_thumbnails(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let report = state.media.reconciler.reconcile_missing_thumbnails().await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/v0/videos/{id}/thumbnail",
    tag = "thumbnails",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video with its thumbnail", body = Video),
        (status = 404, description = "Video not found or thumbnail still unavailable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "retry_video_thumbnail"))]
pub async fn retry_video_thumbnail(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state.media.reconciler.retry_thumbnail(id).await?;
    Ok(Json(video))
}
