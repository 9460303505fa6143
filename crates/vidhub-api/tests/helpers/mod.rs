//! Test helpers: build AppState and router over in-memory stores.
//!
//! Run from workspace root: `cargo test -p vidhub-api`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use std::sync::Arc;
use vidhub_api::constants;
use vidhub_api::setup::routes;
use vidhub_api::state::AppState;
use vidhub_core::{Config, VideoPlatformConfig};
use vidhub_db::test_helpers::MemoryStore;
use vidhub_providers::test_helpers::{MockImageHost, MockProvider};

/// Upload limits used by the test config.
pub const TEST_MAX_VIDEO_SIZE: usize = 1024 * 1024;
pub const TEST_MAX_THUMBNAIL_SIZE: usize = 64 * 1024;

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server plus handles on the in-memory doubles.
pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
    pub provider: MockProvider,
    pub image_host: MockImageHost,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

/// Config with every retry delay at zero so tests never sleep.
pub fn test_config() -> Config {
    Config(Box::new(VideoPlatformConfig {
        database_url: "postgres://localhost/vidhub_test".to_string(),
        max_video_size_bytes: TEST_MAX_VIDEO_SIZE,
        max_thumbnail_size_bytes: TEST_MAX_THUMBNAIL_SIZE,
        ingest_thumbnail_grace_secs: 0,
        ingest_thumbnail_retry_delay_secs: 0,
        reconcile_retry_delay_ms: 0,
        ..Default::default()
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(MemoryStore::new(), MockProvider::new(), MockImageHost::new()).await
}

pub async fn setup_test_app_with(
    store: MemoryStore,
    provider: MockProvider,
    image_host: MockImageHost,
) -> TestApp {
    let config = test_config();
    let state = Arc::new(AppState::new(
        config.clone(),
        None,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(provider.clone()),
        Arc::new(image_host.clone()),
    ));

    let router = routes::setup_routes(&config, state)
        .await
        .expect("routes should build");
    let server = TestServer::new(router.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        store,
        provider,
        image_host,
    }
}

/// Multipart form with a single video file under `field`.
pub fn video_form(field: &str, data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name("clip.mp4")
        .mime_type("video/mp4");
    MultipartForm::new().add_part(field.to_string(), part)
}

fn image_part(data: Vec<u8>, mime: &str) -> Part {
    Part::bytes(bytes::Bytes::from(data))
        .file_name("cover.jpg")
        .mime_type(mime)
}

/// Video form with an extra `thumbnail` part.
pub fn video_form_with_thumbnail(data: Vec<u8>, thumbnail: Vec<u8>, mime: &str) -> MultipartForm {
    video_form("file", data).add_part("thumbnail", image_part(thumbnail, mime))
}

/// Standalone thumbnail form, optionally naming the video it belongs to.
pub fn thumbnail_form(data: Vec<u8>, mime: &str, video_id: Option<&str>) -> MultipartForm {
    let form = MultipartForm::new().add_part("thumbnail", image_part(data, mime));
    match video_id {
        Some(id) => form.add_text("videoId", id.to_string()),
        None => form,
    }
}
