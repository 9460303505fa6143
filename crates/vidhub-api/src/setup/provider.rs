//! Video provider and image host selection

use anyhow::{Context, Result};
use std::sync::Arc;
use vidhub_core::Config;
use vidhub_providers::{create_image_host, create_provider, ImageHost, VideoProvider};

/// Build the provider chosen by `VIDEO_PROVIDER`.
///
/// Missing credentials only produce a warning here: browsing and record
/// management keep working, and uploads fail with a configuration error.
pub fn setup_provider(config: &Config) -> Result<Arc<dyn VideoProvider>> {
    let provider = create_provider(config).context("Failed to create video provider")?;

    if config.provider_credentials_present() {
        tracing::info!(
            provider = %provider.backend_type(),
            metadata_timeout_secs = config.provider_metadata_timeout().as_secs(),
            upload_timeout_secs = config.provider_upload_timeout().as_secs(),
            "Video provider configured"
        );
    } else {
        tracing::warn!(
            provider = %provider.backend_type(),
            "Video provider credentials are not set - uploads and thumbnail lookups will fail"
        );
    }

    Ok(provider)
}

/// Build the image host for client-supplied thumbnails.
///
/// Without credentials, uploads that carry a thumbnail fail with a
/// configuration error; uploads without one are unaffected.
pub fn setup_image_host(config: &Config) -> Result<Arc<dyn ImageHost>> {
    let image_host = create_image_host(config).context("Failed to create image host")?;

    if config.image_host_credentials_present() {
        tracing::info!(
            upload_timeout_secs = config.thumbnail_upload_timeout().as_secs(),
            "Image host configured"
        );
    } else {
        tracing::warn!("Cloudinary credentials are not set - custom thumbnails are disabled");
    }

    Ok(image_host)
}
