//! Scripted provider for testing without network access
//!
//! Thumbnail lookups replay a per-video script of steps; once a script runs
//! out every further lookup reports `Pending`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vidhub_core::models::UploadFile;
use vidhub_core::ProviderBackend;

use crate::traits::{
    ProviderError, ProviderResult, ThumbnailStatus, UploadTarget, UploadedVideo, VideoProvider,
};

/// One scripted answer to `get_thumbnail`
#[derive(Debug, Clone)]
pub enum ThumbnailStep {
    Ready(String),
    Pending,
    Error,
    /// Fails the way a provider missing a setting only it needs for lookups does
    MissingCredentials,
}

#[derive(Default)]
struct Script {
    thumbnails: HashMap<String, VecDeque<ThumbnailStep>>,
    thumbnail_calls: HashMap<String, u32>,
    deleted: Vec<String>,
    upload_target_error: Option<String>,
    transmit_error: Option<String>,
    missing_credentials: bool,
    empty_upload_result: bool,
    fail_delete: bool,
}

/// Mock provider
#[derive(Clone, Default)]
pub struct MockProvider {
    script: Arc<Mutex<Script>>,
    uploads: Arc<AtomicU32>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue thumbnail answers for one provider video id.
    pub fn script_thumbnails(&self, provider_video_id: &str, steps: Vec<ThumbnailStep>) {
        self.script
            .lock()
            .unwrap()
            .thumbnails
            .insert(provider_video_id.to_string(), steps.into());
    }

    pub fn fail_upload_target(&self, message: &str) {
        self.script.lock().unwrap().upload_target_error = Some(message.to_string());
    }

    pub fn fail_transmit(&self, message: &str) {
        self.script.lock().unwrap().transmit_error = Some(message.to_string());
    }

    pub fn without_credentials(&self) {
        self.script.lock().unwrap().missing_credentials = true;
    }

    /// Accept uploads but answer with an empty id and link.
    pub fn return_empty_upload(&self) {
        self.script.lock().unwrap().empty_upload_result = true;
    }

    pub fn fail_delete(&self) {
        self.script.lock().unwrap().fail_delete = true;
    }

    pub fn thumbnail_calls(&self, provider_video_id: &str) -> u32 {
        self.script
            .lock()
            .unwrap()
            .thumbnail_calls
            .get(provider_video_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_thumbnail_calls(&self) -> u32 {
        self.script.lock().unwrap().thumbnail_calls.values().sum()
    }

    pub fn upload_count(&self) -> u32 {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.script.lock().unwrap().deleted.clone()
    }

    /// Id the next successful upload will receive.
    pub fn next_video_id(&self) -> String {
        format!("mock-video-{}", self.upload_count() + 1)
    }
}

#[async_trait]
impl VideoProvider for MockProvider {
    fn check_credentials(&self) -> ProviderResult<()> {
        if self.script.lock().unwrap().missing_credentials {
            return Err(ProviderError::MissingCredentials(
                "mock credentials not set".to_string(),
            ));
        }
        Ok(())
    }

    async fn request_upload_target(&self, filename: &str) -> ProviderResult<UploadTarget> {
        let script = self.script.lock().unwrap();
        if script.missing_credentials {
            return Err(ProviderError::MissingCredentials(
                "mock credentials not set".to_string(),
            ));
        }
        if let Some(message) = &script.upload_target_error {
            return Err(ProviderError::UploadTargetFailed(message.clone()));
        }
        Ok(UploadTarget {
            destination: format!("mock://upload/{}", filename),
            provider_video_id: None,
        })
    }

    async fn transmit(
        &self,
        _target: &UploadTarget,
        _file: &UploadFile,
    ) -> ProviderResult<UploadedVideo> {
        let (transmit_error, empty) = {
            let script = self.script.lock().unwrap();
            (script.transmit_error.clone(), script.empty_upload_result)
        };
        if let Some(message) = transmit_error {
            return Err(ProviderError::TransmitFailed(message));
        }
        if empty {
            return Ok(UploadedVideo {
                provider_video_id: String::new(),
                playback_link: String::new(),
            });
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("mock-video-{}", n);
        Ok(UploadedVideo {
            playback_link: format!("https://provider.test/v/{}", id),
            provider_video_id: id,
        })
    }

    async fn get_thumbnail(&self, provider_video_id: &str) -> ProviderResult<ThumbnailStatus> {
        let mut script = self.script.lock().unwrap();
        *script
            .thumbnail_calls
            .entry(provider_video_id.to_string())
            .or_insert(0) += 1;
        if script.missing_credentials {
            return Err(ProviderError::MissingCredentials(
                "mock credentials not set".to_string(),
            ));
        }
        let step = script
            .thumbnails
            .get_mut(provider_video_id)
            .and_then(|steps| steps.pop_front())
            .unwrap_or(ThumbnailStep::Pending);
        match step {
            ThumbnailStep::Ready(url) => Ok(ThumbnailStatus::Ready(url)),
            ThumbnailStep::Pending => Ok(ThumbnailStatus::Pending("not ready".to_string())),
            ThumbnailStep::Error => Err(ProviderError::ThumbnailFailed(
                "scripted failure".to_string(),
            )),
            ThumbnailStep::MissingCredentials => Err(ProviderError::MissingCredentials(
                "scripted missing setting".to_string(),
            )),
        }
    }

    async fn delete(&self, provider_video_id: &str) -> ProviderResult<()> {
        let mut script = self.script.lock().unwrap();
        if script.fail_delete {
            return Err(ProviderError::DeleteFailed("scripted failure".to_string()));
        }
        script.deleted.push(provider_video_id.to_string());
        Ok(())
    }

    fn backend_type(&self) -> ProviderBackend {
        ProviderBackend::Streamtape
    }
}
