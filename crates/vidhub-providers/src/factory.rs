use std::sync::Arc;

use reqwest::Client;
use vidhub_core::{Config, ProviderBackend};

use crate::{
    BunnyProvider, CloudinaryImageHost, ImageHost, ProviderError, ProviderResult,
    StreamtapeProvider, VideoProvider,
};

/// Create the video provider selected by configuration.
///
/// Missing credentials do not fail here; each call reports them so the
/// server can still start and serve browsing endpoints.
pub fn create_provider(config: &Config) -> ProviderResult<Arc<dyn VideoProvider>> {
    let http_client = http_client(config)?;

    match config.video_provider() {
        ProviderBackend::Streamtape => Ok(Arc::new(StreamtapeProvider::new(
            http_client,
            config.streamtape_api_url(),
            config.streamtape_login().map(String::from),
            config.streamtape_key().map(String::from),
            config.provider_metadata_timeout(),
            config.provider_upload_timeout(),
        ))),
        ProviderBackend::Bunny => Ok(Arc::new(BunnyProvider::new(
            http_client,
            config.bunny_api_url(),
            config.bunny_api_key().map(String::from),
            config.bunny_library_id().map(String::from),
            config.bunny_cdn_hostname().map(String::from),
            config.provider_metadata_timeout(),
            config.provider_upload_timeout(),
        ))),
    }
}

/// Create the image host used for client-supplied thumbnails.
pub fn create_image_host(config: &Config) -> ProviderResult<Arc<dyn ImageHost>> {
    Ok(Arc::new(CloudinaryImageHost::new(
        http_client(config)?,
        config.cloudinary_api_url(),
        config.cloudinary_cloud_name().map(String::from),
        config.cloudinary_api_key().map(String::from),
        config.cloudinary_api_secret().map(String::from),
        config.thumbnail_upload_timeout(),
    )))
}

fn http_client(config: &Config) -> ProviderResult<Client> {
    Client::builder()
        .connect_timeout(config.provider_metadata_timeout())
        .build()
        .map_err(|e| ProviderError::InvalidResponse(format!("HTTP client setup failed: {}", e)))
}
