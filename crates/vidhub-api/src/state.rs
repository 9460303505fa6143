//! Application state shared by every handler.

use sqlx::PgPool;
use std::sync::Arc;
use vidhub_core::Config;
use vidhub_db::{CategoryStore, VideoStore};
use vidhub_processing::{IngestOrchestrator, ThumbnailReconciler};
use vidhub_providers::{ImageHost, VideoProvider};

/// Record stores plus the pool used for readiness checks.
///
/// `pool` is `None` when the stores are not backed by PostgreSQL (in-memory
/// stores in tests); readiness then only reports the process as up.
#[derive(Clone)]
pub struct DbState {
    pub pool: Option<PgPool>,
    pub videos: Arc<dyn VideoStore>,
    pub categories: Arc<dyn CategoryStore>,
}

/// Provider-facing workflows. Both share the one provider selected at startup.
#[derive(Clone)]
pub struct MediaState {
    pub provider: Arc<dyn VideoProvider>,
    pub image_host: Arc<dyn ImageHost>,
    pub ingest: IngestOrchestrator,
    pub reconciler: ThumbnailReconciler,
    pub max_video_size: usize,
    pub max_thumbnail_size: usize,
}

pub struct AppState {
    pub db: DbState,
    pub media: MediaState,
    pub config: Config,
}

impl AppState {
    /// Wire the workflows from configuration around the given stores and hosts.
    pub fn new(
        config: Config,
        pool: Option<PgPool>,
        videos: Arc<dyn VideoStore>,
        categories: Arc<dyn CategoryStore>,
        provider: Arc<dyn VideoProvider>,
        image_host: Arc<dyn ImageHost>,
    ) -> Self {
        let ingest =
            IngestOrchestrator::from_config(provider.clone(), image_host.clone(), &config);
        let reconciler =
            ThumbnailReconciler::from_config(videos.clone(), provider.clone(), &config);

        Self {
            db: DbState {
                pool,
                videos,
                categories,
            },
            media: MediaState {
                provider,
                image_host,
                ingest,
                reconciler,
                max_video_size: config.max_video_size_bytes(),
                max_thumbnail_size: config.max_thumbnail_size_bytes(),
            },
            config,
        }
    }
}
