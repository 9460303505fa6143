//! Domain route groups (uploads, videos, categories).

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use std::sync::Arc;

pub fn upload_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/uploads", API_PREFIX),
            post(handlers::video_upload::upload_video),
        )
        .route(
            &format!("{}/thumbnails", API_PREFIX),
            post(handlers::video_upload::upload_thumbnail),
        )
        .route(
            &format!("{}/thumbnails/reconcile", API_PREFIX),
            post(handlers::thumbnails::reconcile_thumbnails),
        )
        .with_state(state)
}

pub fn video_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/videos", API_PREFIX),
            get(handlers::videos::list_videos).post(handlers::videos::create_video),
        )
        .route(
            &format!("{}/videos/{{id}}", API_PREFIX),
            get(handlers::videos::get_video)
                .put(handlers::videos::update_video)
                .delete(handlers::videos::delete_video),
        )
        .route(
            &format!("{}/videos/{{id}}/thumbnail", API_PREFIX),
            post(handlers::thumbnails::retry_video_thumbnail),
        )
        .with_state(state)
}

pub fn category_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/categories", API_PREFIX),
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            &format!("{}/categories/{{id}}", API_PREFIX),
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route(
            &format!("{}/categories/{{id}}/videos", API_PREFIX),
            get(handlers::categories::list_category_videos),
        )
        .with_state(state)
}
