use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::upload::{extract_thumbnail_upload, extract_video_upload};
use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use vidhub_core::models::{IngestResult, ThumbnailUploadResult};

/// Upload a video to the configured provider.
///
/// An optional `thumbnail` image part is stored on the image host and used as
/// the thumbnail. Otherwise waits a bounded time for the provider's thumbnail.
/// Nothing is stored: the client registers the returned triple with
/// `POST /videos`.
#[utoipa::path(
    post,
    path = "/api/v0/uploads",
    tag = "uploads",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video uploaded; thumbnail_url is null when the provider was not ready in time", body = IngestResult),
        (status = 400, description = "Missing or empty file, or a thumbnail that is not an image", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Video provider or image host is not configured", body = ErrorResponse),
        (status = 502, description = "Provider rejected the upload", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_video"))]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_video_upload(
        multipart,
        state.media.max_video_size,
        state.media.max_thumbnail_size,
    )
    .await?;

    tracing::info!(
        filename = %upload.video.filename,
        size = upload.video.len(),
        content_type = ?upload.video.content_type,
        custom_thumbnail = upload.thumbnail.is_some(),
        "Video upload received"
    );

    let result = state
        .media
        .ingest
        .ingest(upload.video, upload.thumbnail)
        .await?;

    Ok(Json(result))
}

/// Store a thumbnail image on the image host.
///
/// Returns the hosted URL for use as `thumbnail_url` when registering a video.
/// No record is changed.
#[utoipa::path(
    post,
    path = "/api/v0/thumbnails",
    tag = "thumbnails",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = ThumbnailUploadResult),
        (status = 400, description = "Missing thumbnail or not an image", body = ErrorResponse),
        (status = 413, description = "Image too large", body = ErrorResponse),
        (status = 500, description = "Image host is not configured", body = ErrorResponse),
        (status = 502, description = "Image host rejected the upload", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload_thumbnail"))]
pub async fn upload_thumbnail(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let upload = extract_thumbnail_upload(multipart, state.media.max_thumbnail_size).await?;

    let result = state
        .media
        .ingest
        .upload_thumbnail(upload.thumbnail, upload.video_id)
        .await?;

    Ok(Json(result))
}
