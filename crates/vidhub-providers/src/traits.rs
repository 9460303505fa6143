//! Provider abstraction trait

use async_trait::async_trait;
use thiserror::Error;
use vidhub_core::models::UploadFile;
use vidhub_core::{AppError, ProviderBackend};

/// Provider operation errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Failed to obtain upload target: {0}")]
    UploadTargetFailed(String),

    #[error("Transmit failed: {0}")]
    TransmitFailed(String),

    #[error("Thumbnail request failed: {0}")]
    ThumbnailFailed(String),

    #[error("Provider failed to process video: {0}")]
    ProcessingFailed(String),

    #[error("Image upload failed: {0}")]
    ImageUploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Video not found on provider: {0}")]
    NotFound(String),

    #[error("Provider request timed out: {0}")]
    Timeout(String),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    /// Classify a transport error, keeping timeouts distinct.
    pub(crate) fn from_request(err: reqwest::Error, wrap: fn(String) -> ProviderError) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else {
            wrap(err.to_string())
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::MissingCredentials(msg) => AppError::Configuration(msg),
            ProviderError::NotFound(msg) => AppError::NotFound(msg),
            ProviderError::UploadTargetFailed(_)
            | ProviderError::TransmitFailed(_)
            | ProviderError::ImageUploadFailed(_)
            | ProviderError::Timeout(_)
            | ProviderError::InvalidResponse(_) => AppError::UploadFailed(err.to_string()),
            ProviderError::ThumbnailFailed(_)
            | ProviderError::ProcessingFailed(_)
            | ProviderError::DeleteFailed(_) => AppError::Internal(err.to_string()),
        }
    }
}

/// Where the payload has to be sent.
///
/// Some providers assign the video id during the handshake (Bunny), others
/// only once the payload is accepted (Streamtape).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub destination: String,
    pub provider_video_id: Option<String>,
}

/// A video accepted by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVideo {
    pub provider_video_id: String,
    pub playback_link: String,
}

/// Thumbnail lookup result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailStatus {
    Ready(String),
    /// Still processing; carries the provider's explanation.
    Pending(String),
}

/// Video hosting abstraction trait
///
/// Every method is a single bounded request; retries are the caller's concern.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Fails with [`ProviderError::MissingCredentials`] when a setting the
    /// provider needs for any operation is absent. Makes no request.
    fn check_credentials(&self) -> ProviderResult<()>;

    /// First half of the upload handshake.
    async fn request_upload_target(&self, filename: &str) -> ProviderResult<UploadTarget>;

    /// Send the payload to a target obtained from `request_upload_target`.
    async fn transmit(
        &self,
        target: &UploadTarget,
        file: &UploadFile,
    ) -> ProviderResult<UploadedVideo>;

    async fn get_thumbnail(&self, provider_video_id: &str) -> ProviderResult<ThumbnailStatus>;

    async fn delete(&self, provider_video_id: &str) -> ProviderResult<()>;

    fn backend_type(&self) -> ProviderBackend;
}

/// An image stored on the image host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedImage {
    pub url: String,
    pub public_id: String,
}

/// Image hosting for thumbnails supplied by clients
#[async_trait]
pub trait ImageHost: Send + Sync {
    fn check_credentials(&self) -> ProviderResult<()>;

    async fn upload_image(&self, file: &UploadFile) -> ProviderResult<HostedImage>;
}
