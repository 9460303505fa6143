use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;
use vidhub_core::models::{
    CreateVideoRequest, ListVideosQuery, NewVideo, UpdateVideoRequest, Video,
};
use vidhub_core::AppError;

fn video_not_found() -> AppError {
    AppError::NotFound("Video not found".to_string())
}

#[utoipa::path(
    get,
    path = "/api/v0/videos",
    tag = "videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "Videos, newest first", body = Vec<Video>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, params),
    fields(limit = params.limit, offset = params.offset, operation = "list_videos")
)]
pub async fn list_videos(
    Query(params): Query<ListVideosQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (limit, offset) = params.clamped();
    let videos = state.db.videos.list_videos(limit, offset).await?;
    Ok(Json(videos))
}

/// Register a video previously uploaded through `POST /uploads`.
#[utoipa::path(
    post,
    path = "/api/v0/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video created", body = Video),
        (status = 400, description = "Invalid input or unknown category", body = ErrorResponse),
        (status = 409, description = "Provider video already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(
        category_id = %request.category_id,
        provider_video_id = %request.provider_video_id,
        operation = "create_video"
    )
)]
pub async fn create_video(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    request.validate()?;

    let new_video = NewVideo::from(request);
    if new_video.title.is_empty() {
        return Err(AppError::InvalidInput("Title cannot be blank".to_string()).into());
    }

    let video = state.db.videos.create_video(new_video).await?;
    tracing::info!(video_id = %video.id, has_thumbnail = video.has_thumbnail(), "Video created");

    Ok((StatusCode::CREATED, Json(video)))
}

#[utoipa::path(
    get,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Video found", body = Video),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "get_video"))]
pub async fn get_video(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .db
        .videos
        .get_video(id)
        .await?
        .ok_or_else(video_not_found)?;
    Ok(Json(video))
}

/// Apply an engagement action (view or like counter).
#[utoipa::path(
    put,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    request_body = UpdateVideoRequest,
    responses(
        (status = 200, description = "Counters updated", body = Video),
        (status = 400, description = "Unknown action", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, request),
    fields(video_id = %id, action = ?request.action, operation = "update_video")
)]
pub async fn update_video(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UpdateVideoRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (field, delta) = request.action.counter_delta();
    let video = state
        .db
        .videos
        .increment_field(id, field, delta)
        .await?
        .ok_or_else(video_not_found)?;
    Ok(Json(video))
}

/// Delete the record, then ask the provider to drop the hosted file.
///
/// The provider call is best effort: a failure is logged and the request
/// still succeeds, since the record is already gone.
#[utoipa::path(
    delete,
    path = "/api/v0/videos/{id}",
    tag = "videos",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(video_id = %id, operation = "delete_video"))]
pub async fn delete_video(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let video = state
        .db
        .videos
        .delete_video(id)
        .await?
        .ok_or_else(video_not_found)?;

    if let Err(e) = state.media.provider.delete(&video.provider_video_id).await {
        tracing::warn!(
            error = %e,
            provider_video_id = %video.provider_video_id,
            "Failed to delete video from provider"
        );
    }

    tracing::info!(provider_video_id = %video.provider_video_id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
