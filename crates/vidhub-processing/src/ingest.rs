//! Upload orchestration
//!
//! Hands a received file to the provider, then polls for the thumbnail the
//! provider generates asynchronously. The thumbnail is best effort: when it is
//! not ready within the budget the upload still succeeds and the record is
//! picked up later by the reconciliation sweep. A thumbnail supplied by the
//! client is stored on the image host instead and no polling happens.

use std::sync::Arc;

use vidhub_core::models::{IngestResult, ThumbnailUploadResult, UploadFile};
use vidhub_core::{AppError, Config};
use vidhub_providers::{ImageHost, ProviderError, ThumbnailStatus, VideoProvider};

use crate::retry::{poll_until_or_abort, PollOutcome, RetryPolicy};

#[derive(Clone)]
pub struct IngestOrchestrator {
    provider: Arc<dyn VideoProvider>,
    image_host: Arc<dyn ImageHost>,
    thumbnail_policy: RetryPolicy,
}

impl IngestOrchestrator {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        image_host: Arc<dyn ImageHost>,
        thumbnail_policy: RetryPolicy,
    ) -> Self {
        Self {
            provider,
            image_host,
            thumbnail_policy,
        }
    }

    pub fn from_config(
        provider: Arc<dyn VideoProvider>,
        image_host: Arc<dyn ImageHost>,
        config: &Config,
    ) -> Self {
        let policy = RetryPolicy::fixed(
            config.ingest_thumbnail_max_attempts(),
            config.ingest_thumbnail_retry_delay(),
        )
        .with_initial_delay(config.ingest_thumbnail_grace());
        Self::new(provider, image_host, policy)
    }

    pub fn thumbnail_policy(&self) -> &RetryPolicy {
        &self.thumbnail_policy
    }

    /// Upload `file` and resolve its thumbnail.
    ///
    /// With `thumbnail` the image is stored on the image host and its URL is
    /// used; if that upload fails the provider is polled as usual. Nothing is
    /// persisted; the caller decides what to do with the result.
    #[tracing::instrument(
        skip(self, file, thumbnail),
        fields(
            filename = %file.filename,
            size = file.len(),
            custom_thumbnail = thumbnail.is_some(),
            provider = %self.provider.backend_type()
        )
    )]
    pub async fn ingest(
        &self,
        file: UploadFile,
        thumbnail: Option<UploadFile>,
    ) -> Result<IngestResult, AppError> {
        self.provider.check_credentials().map_err(configuration_error)?;
        if thumbnail.is_some() {
            self.image_host
                .check_credentials()
                .map_err(configuration_error)?;
        }

        let target = self
            .provider
            .request_upload_target(&file.filename)
            .await
            .map_err(upload_error)?;

        let uploaded = self
            .provider
            .transmit(&target, &file)
            .await
            .map_err(upload_error)?;

        if uploaded.provider_video_id.trim().is_empty() || uploaded.playback_link.trim().is_empty()
        {
            tracing::error!("Provider accepted the upload but returned no id or link");
            return Err(AppError::UploadFailed(
                "Provider returned an empty video id or link".to_string(),
            ));
        }

        let custom_thumbnail = match thumbnail {
            Some(image) => match self.image_host.upload_image(&image).await {
                Ok(hosted) => {
                    tracing::info!(
                        provider_video_id = %uploaded.provider_video_id,
                        thumbnail_id = %hosted.public_id,
                        "Custom thumbnail stored"
                    );
                    Some(hosted.url)
                }
                Err(e) => {
                    tracing::warn!(
                        provider_video_id = %uploaded.provider_video_id,
                        error = %e,
                        "Custom thumbnail upload failed, falling back to the provider thumbnail"
                    );
                    None
                }
            },
            None => None,
        };

        let thumbnail_url = match custom_thumbnail {
            Some(url) => Some(url),
            None => self.wait_for_thumbnail(&uploaded.provider_video_id).await?,
        };

        Ok(IngestResult {
            provider_video_id: uploaded.provider_video_id,
            playback_link: uploaded.playback_link,
            thumbnail_url,
        })
    }

    /// Store a client-supplied thumbnail on the image host.
    #[tracing::instrument(
        skip(self, image),
        fields(filename = %image.filename, size = image.len())
    )]
    pub async fn upload_thumbnail(
        &self,
        image: UploadFile,
        video_id: Option<String>,
    ) -> Result<ThumbnailUploadResult, AppError> {
        self.image_host
            .check_credentials()
            .map_err(configuration_error)?;

        let hosted = self.image_host.upload_image(&image).await.map_err(|e| {
            tracing::error!(error = %e, "Thumbnail upload to image host failed");
            AppError::from(e)
        })?;

        Ok(ThumbnailUploadResult {
            thumbnail_url: hosted.url,
            thumbnail_id: hosted.public_id,
            video_id,
        })
    }

    async fn wait_for_thumbnail(
        &self,
        provider_video_id: &str,
    ) -> Result<Option<String>, AppError> {
        tracing::info!(%provider_video_id, "Video uploaded, waiting for thumbnail");

        match poll_thumbnail(
            &self.provider,
            &self.thumbnail_policy,
            "ingest_thumbnail",
            provider_video_id,
        )
        .await
        {
            PollOutcome::Ready { value, attempts } => {
                tracing::info!(%provider_video_id, attempts, "Thumbnail retrieved");
                Ok(Some(value))
            }
            PollOutcome::Exhausted { attempts, .. } => {
                tracing::warn!(
                    %provider_video_id,
                    attempts,
                    "Thumbnail not available after all attempts; video uploaded without it"
                );
                Ok(None)
            }
            PollOutcome::Aborted { error, .. } => Err(AppError::Configuration(error)),
        }
    }
}

/// Poll the provider for a thumbnail under `policy`.
///
/// Not-ready answers, empty URLs and request errors count as misses. Missing
/// credentials abort the loop.
pub(crate) async fn poll_thumbnail(
    provider: &Arc<dyn VideoProvider>,
    policy: &RetryPolicy,
    label: &str,
    provider_video_id: &str,
) -> PollOutcome<String> {
    let provider = provider.clone();
    let id = provider_video_id.to_string();

    poll_until_or_abort(
        policy,
        label,
        |e: &ProviderError| matches!(e, ProviderError::MissingCredentials(_)),
        move |_| {
            let provider = provider.clone();
            let id = id.clone();
            async move {
                let status: Result<ThumbnailStatus, ProviderError> =
                    provider.get_thumbnail(&id).await;
                status.map(|status| match status {
                    ThumbnailStatus::Ready(url) if !url.trim().is_empty() => Some(url),
                    ThumbnailStatus::Ready(_) => None,
                    ThumbnailStatus::Pending(reason) => {
                        tracing::debug!(provider_video_id = %id, %reason, "Thumbnail pending");
                        None
                    }
                })
            }
        },
    )
    .await
}

pub(crate) fn configuration_error(err: ProviderError) -> AppError {
    tracing::error!(error = %err, "Provider credentials are not configured");
    match err {
        ProviderError::MissingCredentials(msg) => AppError::Configuration(msg),
        other => AppError::from(other),
    }
}

fn upload_error(err: ProviderError) -> AppError {
    match err {
        ProviderError::MissingCredentials(_) => configuration_error(err),
        other => {
            tracing::error!(error = %other, "Upload to video provider failed");
            AppError::UploadFailed(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::time::Duration;
    use vidhub_providers::test_helpers::{MockImageHost, MockProvider, ThumbnailStep};

    fn orchestrator(provider: &MockProvider) -> IngestOrchestrator {
        orchestrator_with(provider, &MockImageHost::new())
    }

    fn orchestrator_with(provider: &MockProvider, images: &MockImageHost) -> IngestOrchestrator {
        IngestOrchestrator::new(
            Arc::new(provider.clone()),
            Arc::new(images.clone()),
            RetryPolicy::fixed(5, Duration::ZERO),
        )
    }

    fn cover() -> UploadFile {
        UploadFile {
            filename: "cover.jpg".to_string(),
            content_type: Some("image/jpeg".to_string()),
            data: Bytes::from_static(b"jpeg"),
        }
    }

    fn file() -> UploadFile {
        UploadFile {
            filename: "clip.mp4".to_string(),
            content_type: Some("video/mp4".to_string()),
            data: Bytes::from_static(b"video"),
        }
    }

    #[test]
    fn test_from_config_uses_ingest_budget() {
        let config = Config(Box::default());
        let orchestrator = IngestOrchestrator::from_config(
            Arc::new(MockProvider::new()),
            Arc::new(MockImageHost::new()),
            &config,
        );
        let policy = orchestrator.thumbnail_policy();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_secs(10));
        assert_eq!(policy.delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_ingest_returns_thumbnail_when_ready() {
        let provider = MockProvider::new();
        provider.script_thumbnails(
            "mock-video-1",
            vec![
                ThumbnailStep::Pending,
                ThumbnailStep::Ready("https://thumbs.test/1.jpg".to_string()),
            ],
        );

        let result = orchestrator(&provider).ingest(file(), None).await.unwrap();
        assert_eq!(result.provider_video_id, "mock-video-1");
        assert_eq!(result.playback_link, "https://provider.test/v/mock-video-1");
        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://thumbs.test/1.jpg")
        );
        assert_eq!(provider.thumbnail_calls("mock-video-1"), 2);
    }

    #[tokio::test]
    async fn test_ingest_succeeds_without_thumbnail_after_five_misses() {
        let provider = MockProvider::new();
        provider.script_thumbnails(
            "mock-video-1",
            vec![
                ThumbnailStep::Pending,
                ThumbnailStep::Error,
                ThumbnailStep::Pending,
                ThumbnailStep::Error,
                ThumbnailStep::Pending,
                ThumbnailStep::Ready("too late".to_string()),
            ],
        );

        let result = orchestrator(&provider).ingest(file(), None).await.unwrap();
        assert!(!result.provider_video_id.is_empty());
        assert!(!result.playback_link.is_empty());
        assert_eq!(result.thumbnail_url, None);
        assert_eq!(provider.thumbnail_calls("mock-video-1"), 5);
    }

    #[tokio::test]
    async fn test_handshake_failure_is_upload_failed() {
        let provider = MockProvider::new();
        provider.fail_upload_target("status 403");

        let err = orchestrator(&provider).ingest(file(), None).await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
        assert_eq!(provider.total_thumbnail_calls(), 0);
        assert_eq!(provider.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_transmit_failure_is_upload_failed() {
        let provider = MockProvider::new();
        provider.fail_transmit("connection reset");

        let err = orchestrator(&provider).ingest(file(), None).await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let provider = MockProvider::new();
        provider.without_credentials();

        let err = orchestrator(&provider).ingest(file(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(provider.upload_count(), 0);
        assert_eq!(provider.total_thumbnail_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_setting_during_polling_stops_at_once() {
        let provider = MockProvider::new();
        provider.script_thumbnails(
            "mock-video-1",
            vec![ThumbnailStep::Pending, ThumbnailStep::MissingCredentials],
        );

        let err = orchestrator(&provider).ingest(file(), None).await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(provider.thumbnail_calls("mock-video-1"), 2);
    }

    #[tokio::test]
    async fn test_custom_thumbnail_skips_polling() {
        let provider = MockProvider::new();
        let images = MockImageHost::new();

        let result = orchestrator_with(&provider, &images)
            .ingest(file(), Some(cover()))
            .await
            .unwrap();

        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://images.test/thumbnails/1.jpg")
        );
        assert_eq!(images.uploaded(), vec!["cover.jpg".to_string()]);
        assert_eq!(provider.total_thumbnail_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_custom_thumbnail_falls_back_to_polling() {
        let provider = MockProvider::new();
        let images = MockImageHost::new();
        images.fail_upload("Invalid Signature");
        provider.script_thumbnails(
            "mock-video-1",
            vec![ThumbnailStep::Ready("https://thumbs.test/1.jpg".to_string())],
        );

        let result = orchestrator_with(&provider, &images)
            .ingest(file(), Some(cover()))
            .await
            .unwrap();

        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://thumbs.test/1.jpg")
        );
        assert_eq!(provider.thumbnail_calls("mock-video-1"), 1);
    }

    #[tokio::test]
    async fn test_custom_thumbnail_without_image_host_credentials() {
        let provider = MockProvider::new();
        let images = MockImageHost::new();
        images.without_credentials();

        let err = orchestrator_with(&provider, &images)
            .ingest(file(), Some(cover()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(provider.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_upload_thumbnail() {
        let provider = MockProvider::new();
        let images = MockImageHost::new();
        let orchestrator = orchestrator_with(&provider, &images);

        let stored = orchestrator
            .upload_thumbnail(cover(), Some("abc".to_string()))
            .await
            .unwrap();
        assert_eq!(stored.thumbnail_url, "https://images.test/thumbnails/1.jpg");
        assert_eq!(stored.thumbnail_id, "thumbnails/1");
        assert_eq!(stored.video_id.as_deref(), Some("abc"));

        images.fail_upload("Invalid Signature");
        let err = orchestrator.upload_thumbnail(cover(), None).await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_provider_identity_is_rejected() {
        let provider = MockProvider::new();
        provider.return_empty_upload();

        let err = orchestrator(&provider).ingest(file(), None).await.unwrap_err();
        assert!(matches!(err, AppError::UploadFailed(_)));
        assert_eq!(provider.total_thumbnail_calls(), 0);
    }
}
