//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use vidhub_core::models;

/// Returns the OpenAPI document for every versioned route.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vidhub API",
        version = "0.1.0",
        description = "Video sharing backend (v0). Uploads go to a hosted video provider (Streamtape or Bunny Stream); records, categories and engagement counters are stored in PostgreSQL. Custom thumbnails are stored on Cloudinary; missing thumbnails are filled in by a reconciliation sweep."
    ),
    paths(
        // Uploads
        handlers::video_upload::upload_video,
        handlers::video_upload::upload_thumbnail,
        // Videos
        handlers::videos::list_videos,
        handlers::videos::create_video,
        handlers::videos::get_video,
        handlers::videos::update_video,
        handlers::videos::delete_video,
        // Thumbnails
        handlers::thumbnails::reconcile_thumbnails,
        handlers::thumbnails::retry_video_thumbnail,
        // Categories
        handlers::categories::list_categories,
        handlers::categories::create_category,
        handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::categories::list_category_videos,
    ),
    components(
        schemas(
            models::Video,
            models::CreateVideoRequest,
            models::UpdateVideoRequest,
            models::VideoAction,
            models::Category,
            models::CreateCategoryRequest,
            models::UpdateCategoryRequest,
            models::IngestResult,
            models::ThumbnailUploadResult,
            models::ReconcileReport,
            models::ReconciledVideo,
            models::ReconcileFailure,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Video upload to the hosting provider"),
        (name = "videos", description = "Video records and engagement counters"),
        (name = "thumbnails", description = "Thumbnail upload and reconciliation"),
        (name = "categories", description = "Category management and browsing")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_versioned_paths() {
        let spec = get_openapi_spec();
        let paths = &spec.paths.paths;
        assert!(paths.contains_key("/api/v0/uploads"));
        assert!(paths.contains_key("/api/v0/videos/{id}"));
        assert!(paths.contains_key("/api/v0/thumbnails/reconcile"));
        assert!(paths.contains_key("/api/v0/thumbnails"));
        assert!(paths.contains_key("/api/v0/categories/{id}/videos"));
    }
}
