//! Thumbnail reconciliation
//!
//! Sweeps records that were saved without a thumbnail and asks the provider
//! again. Failures are per record: one video that is still processing, was
//! deleted mid-sweep or could not be written never stops the others. Missing
//! provider credentials stop everything before the first lookup.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use uuid::Uuid;
use vidhub_core::models::{ReconcileFailure, ReconcileReport, ReconciledVideo, Video};
use vidhub_core::{AppError, Config};
use vidhub_db::VideoStore;
use vidhub_providers::VideoProvider;

use crate::ingest::{configuration_error, poll_thumbnail};
use crate::retry::{PollOutcome, RetryPolicy};

#[derive(Clone)]
pub struct ThumbnailReconciler {
    store: Arc<dyn VideoStore>,
    provider: Arc<dyn VideoProvider>,
    policy: RetryPolicy,
    concurrency: usize,
}

impl ThumbnailReconciler {
    pub fn new(
        store: Arc<dyn VideoStore>,
        provider: Arc<dyn VideoProvider>,
        policy: RetryPolicy,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            provider,
            policy,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(
        store: Arc<dyn VideoStore>,
        provider: Arc<dyn VideoProvider>,
        config: &Config,
    ) -> Self {
        let policy = RetryPolicy::fixed(
            config.reconcile_max_attempts(),
            config.reconcile_retry_delay(),
        );
        Self::new(store, provider, policy, config.reconcile_concurrency())
    }

    /// Retry thumbnail retrieval for every record that lacks one.
    ///
    /// Only missing credentials and the initial query can fail the sweep as a
    /// whole.
    #[tracing::instrument(skip(self), fields(concurrency = self.concurrency))]
    pub async fn reconcile_missing_thumbnails(&self) -> Result<ReconcileReport, AppError> {
        self.provider
            .check_credentials()
            .map_err(configuration_error)?;

        let videos = self.store.find_videos_missing_thumbnail().await?;
        let scanned = videos.len();
        tracing::info!(scanned, "Reconciling videos without thumbnails");

        // buffered() keeps input order and runs one record at a time when concurrency is 1
        let outcomes: Vec<Result<ReconciledVideo, ReconcileFailure>> = stream::iter(videos)
            .map(|video| self.reconcile_one(video))
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let mut report = ReconcileReport {
            scanned,
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(updated) => report.updated.push(updated),
                Err(failed) => report.failed.push(failed),
            }
        }
        report.updated_count = report.updated.len();

        tracing::info!(
            scanned,
            updated = report.updated_count,
            failed = report.failed.len(),
            "Thumbnail reconciliation finished"
        );

        Ok(report)
    }

    /// The outer error is fatal for the sweep; the inner one is reported per record.
    async fn reconcile_one(
        &self,
        video: Video,
    ) -> Result<Result<ReconciledVideo, ReconcileFailure>, AppError> {
        let failure = |reason: String| ReconcileFailure {
            id: video.id,
            provider_video_id: video.provider_video_id.clone(),
            reason,
        };

        let url = match poll_thumbnail(
            &self.provider,
            &self.policy,
            "reconcile_thumbnail",
            &video.provider_video_id,
        )
        .await
        {
            PollOutcome::Ready { value, .. } => value,
            PollOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                tracing::warn!(
                    video_id = %video.id,
                    provider_video_id = %video.provider_video_id,
                    attempts,
                    "Could not get thumbnail"
                );
                return Ok(Err(failure(format!(
                    "thumbnail unavailable after {} attempts ({})",
                    attempts,
                    last_error.unwrap_or_else(|| "not ready".to_string())
                ))));
            }
            PollOutcome::Aborted { error, .. } => return Err(AppError::Configuration(error)),
        };

        Ok(match self.store.update_thumbnail(video.id, &url).await {
            Ok(Some(_)) => {
                tracing::info!(
                    video_id = %video.id,
                    provider_video_id = %video.provider_video_id,
                    thumbnail_url = %url,
                    "Updated thumbnail"
                );
                Ok(ReconciledVideo {
                    id: video.id,
                    provider_video_id: video.provider_video_id.clone(),
                    thumbnail_url: url,
                })
            }
            Ok(None) => {
                tracing::warn!(
                    video_id = %video.id,
                    "Video deleted before its thumbnail was written"
                );
                Err(failure("video no longer exists".to_string()))
            }
            Err(e) => {
                tracing::error!(video_id = %video.id, error = %e, "Failed to store thumbnail");
                Err(failure(format!("failed to store thumbnail: {}", e)))
            }
        })
    }

    /// Retry the thumbnail of a single video.
    ///
    /// A video that already has a thumbnail is returned unchanged without
    /// contacting the provider.
    #[tracing::instrument(skip(self), fields(video_id = %video_id))]
    pub async fn retry_thumbnail(&self, video_id: Uuid) -> Result<Video, AppError> {
        self.provider
            .check_credentials()
            .map_err(configuration_error)?;

        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

        if video.has_thumbnail() {
            tracing::debug!("Video already has a thumbnail");
            return Ok(video);
        }

        match poll_thumbnail(
            &self.provider,
            &self.policy,
            "retry_thumbnail",
            &video.provider_video_id,
        )
        .await
        {
            PollOutcome::Ready { value, .. } => self
                .store
                .update_thumbnail(video_id, &value)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id))),
            PollOutcome::Exhausted { attempts, .. } => {
                Err(AppError::ThumbnailUnavailable(format!(
                    "Thumbnail for video {} is not available yet after {} attempts",
                    video_id, attempts
                )))
            }
            PollOutcome::Aborted { error, .. } => Err(AppError::Configuration(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vidhub_db::test_helpers::MemoryStore;
    use vidhub_providers::test_helpers::{MockProvider, ThumbnailStep};

    fn reconciler(
        store: &MemoryStore,
        provider: &MockProvider,
        concurrency: usize,
    ) -> ThumbnailReconciler {
        ThumbnailReconciler::new(
            Arc::new(store.clone()),
            Arc::new(provider.clone()),
            RetryPolicy::fixed(3, Duration::ZERO),
            concurrency,
        )
    }

    fn ready(url: &str) -> ThumbnailStep {
        ThumbnailStep::Ready(url.to_string())
    }

    #[tokio::test]
    async fn test_sweep_updates_ready_records_and_reports_failures() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");

        let a = store.add_video(category.id, "a", None);
        let b = store.add_video(category.id, "b", Some(""));
        let c = store.add_video(category.id, "c", None);
        let done = store.add_video(
            category.id,
            "done",
            Some("https://thumbs.test/done.jpg"),
        );

        provider.script_thumbnails("a", vec![ready("https://thumbs.test/a.jpg")]);
        provider.script_thumbnails(
            "b",
            vec![
                ThumbnailStep::Pending,
                ThumbnailStep::Error,
                ready("https://thumbs.test/b.jpg"),
            ],
        );
        provider.script_thumbnails(
            "c",
            vec![ThumbnailStep::Pending, ThumbnailStep::Pending, ThumbnailStep::Pending],
        );

        let report = reconciler(&store, &provider, 1)
            .reconcile_missing_thumbnails()
            .await
            .unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.updated_count, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, c.id);

        assert_eq!(provider.thumbnail_calls("a"), 1);
        assert_eq!(provider.thumbnail_calls("b"), 3);
        assert_eq!(provider.thumbnail_calls("c"), 3);
        assert_eq!(provider.thumbnail_calls("done"), 0);

        assert_eq!(
            store.video(a.id).unwrap().thumbnail_url.as_deref(),
            Some("https://thumbs.test/a.jpg")
        );
        assert_eq!(
            store.video(b.id).unwrap().thumbnail_url.as_deref(),
            Some("https://thumbs.test/b.jpg")
        );
        assert_eq!(store.video(c.id).unwrap().thumbnail_url, None);
        assert_eq!(
            store.video(done.id).unwrap().thumbnail_url.as_deref(),
            Some("https://thumbs.test/done.jpg")
        );
    }

    #[tokio::test]
    async fn test_second_sweep_keeps_first_writes() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let a = store.add_video(category.id, "a", None);
        store.add_video(category.id, "b", None);
        provider.script_thumbnails("a", vec![ready("https://thumbs.test/a.jpg")]);

        let reconciler = reconciler(&store, &provider, 1);
        let first = reconciler.reconcile_missing_thumbnails().await.unwrap();
        assert_eq!(first.updated_count, 1);

        let second = reconciler.reconcile_missing_thumbnails().await.unwrap();
        assert_eq!(second.scanned, 1);
        assert_eq!(second.updated_count, 0);
        assert_eq!(
            store.video(a.id).unwrap().thumbnail_url.as_deref(),
            Some("https://thumbs.test/a.jpg")
        );
        assert_eq!(provider.thumbnail_calls("a"), 1);
    }

    #[tokio::test]
    async fn test_record_deleted_mid_sweep_is_reported() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let gone = store.add_video(category.id, "gone", None);
        let kept = store.add_video(category.id, "kept", None);
        provider.script_thumbnails("gone", vec![ready("https://thumbs.test/gone.jpg")]);
        provider.script_thumbnails("kept", vec![ready("https://thumbs.test/kept.jpg")]);
        store.vanish_on_update(gone.id);

        let report = reconciler(&store, &provider, 1)
            .reconcile_missing_thumbnails()
            .await
            .unwrap();

        assert_eq!(report.updated_count, 1);
        assert_eq!(report.updated[0].id, kept.id);
        assert_eq!(report.failed[0].id, gone.id);
        assert_eq!(report.failed[0].reason, "video no longer exists");
    }

    #[tokio::test]
    async fn test_store_write_failure_does_not_abort_sweep() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let broken = store.add_video(category.id, "broken", None);
        store.add_video(category.id, "fine", None);
        provider.script_thumbnails("broken", vec![ready("https://thumbs.test/x.jpg")]);
        provider.script_thumbnails("fine", vec![ready("https://thumbs.test/y.jpg")]);
        store.fail_thumbnail_update(broken.id);

        let report = reconciler(&store, &provider, 1)
            .reconcile_missing_thumbnails()
            .await
            .unwrap();

        assert_eq!(report.updated_count, 1);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.starts_with("failed to store thumbnail"));
    }

    #[tokio::test]
    async fn test_query_failure_aborts_sweep() {
        let store = MemoryStore::new();
        store.fail_missing_thumbnail_query();

        let result = reconciler(&store, &MockProvider::new(), 1)
            .reconcile_missing_thumbnails()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_sweep() {
        let report = reconciler(&MemoryStore::new(), &MockProvider::new(), 1)
            .reconcile_missing_thumbnails()
            .await
            .unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_concurrent_sweep_processes_every_record() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        for i in 0..6 {
            let id = format!("v{}", i);
            store.add_video(category.id, &id, None);
            let url = format!("https://thumbs.test/{}.jpg", i);
            provider.script_thumbnails(&id, vec![ready(&url)]);
        }

        let report = reconciler(&store, &provider, 3)
            .reconcile_missing_thumbnails()
            .await
            .unwrap();
        assert_eq!(report.updated_count, 6);
        assert!(store.find_videos_missing_thumbnail().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_thumbnail_single_video() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let video = store.add_video(category.id, "a", None);
        provider.script_thumbnails(
            "a",
            vec![ThumbnailStep::Pending, ready("https://thumbs.test/a.jpg")],
        );

        let updated = reconciler(&store, &provider, 1)
            .retry_thumbnail(video.id)
            .await
            .unwrap();
        assert_eq!(
            updated.thumbnail_url.as_deref(),
            Some("https://thumbs.test/a.jpg")
        );
    }

    #[tokio::test]
    async fn test_retry_thumbnail_is_noop_when_present() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let video = store.add_video(category.id, "a", Some("https://thumbs.test/old.jpg"));

        let unchanged = reconciler(&store, &provider, 1)
            .retry_thumbnail(video.id)
            .await
            .unwrap();
        assert_eq!(
            unchanged.thumbnail_url.as_deref(),
            Some("https://thumbs.test/old.jpg")
        );
        assert_eq!(provider.total_thumbnail_calls(), 0);
        assert!(store.thumbnail_writes().is_empty());
    }

    #[tokio::test]
    async fn test_retry_thumbnail_errors() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let video = store.add_video(category.id, "slow", None);
        let reconciler = reconciler(&store, &provider, 1);

        let err = reconciler.retry_thumbnail(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = reconciler.retry_thumbnail(video.id).await.unwrap_err();
        assert!(matches!(err, AppError::ThumbnailUnavailable(_)));
        assert_eq!(provider.thumbnail_calls("slow"), 3);
        assert_eq!(store.video(video.id).unwrap().thumbnail_url, None);
    }

    #[tokio::test]
    async fn test_sweep_without_credentials_fails_before_any_lookup() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let video = store.add_video(category.id, "a", None);
        provider.without_credentials();

        let err = reconciler(&store, &provider, 1)
            .reconcile_missing_thumbnails()
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(provider.total_thumbnail_calls(), 0);
        assert_eq!(store.video(video.id).unwrap().thumbnail_url, None);
    }

    #[tokio::test]
    async fn test_missing_setting_during_sweep_stops_it() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        store.add_video(category.id, "a", None);
        store.add_video(category.id, "b", None);
        provider.script_thumbnails("a", vec![ThumbnailStep::MissingCredentials]);
        provider.script_thumbnails("b", vec![ready("https://thumbs.test/b.jpg")]);

        let err = reconciler(&store, &provider, 1)
            .reconcile_missing_thumbnails()
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(provider.thumbnail_calls("a"), 1);
    }

    #[tokio::test]
    async fn test_retry_thumbnail_without_credentials() {
        let store = MemoryStore::new();
        let provider = MockProvider::new();
        let category = store.add_category("Music");
        let video = store.add_video(category.id, "a", None);
        provider.without_credentials();

        let err = reconciler(&store, &provider, 1)
            .retry_thumbnail(video.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert_eq!(provider.total_thumbnail_calls(), 0);
    }

    #[tokio::test]
    async fn test_inline_and_sweep_writes_last_writer_wins() {
        let store = MemoryStore::new();
        let category = store.add_category("Music");
        let video = store.add_video(category.id, "race", None);

        store.update_thumbnail(video.id, "url1").await.unwrap();
        store.update_thumbnail(video.id, "url2").await.unwrap();

        assert_eq!(
            store.video(video.id).unwrap().thumbnail_url.as_deref(),
            Some("url2")
        );
    }
}
