//! In-memory image host

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use vidhub_core::models::UploadFile;

use crate::traits::{HostedImage, ImageHost, ProviderError, ProviderResult};

#[derive(Default)]
struct State {
    uploaded: Vec<String>,
    upload_error: Option<String>,
    missing_credentials: bool,
}

/// Mock image host; the n-th stored image is served from
/// `https://images.test/thumbnails/{n}.jpg`.
#[derive(Clone, Default)]
pub struct MockImageHost {
    state: Arc<Mutex<State>>,
}

impl MockImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upload(&self, message: &str) {
        self.state.lock().unwrap().upload_error = Some(message.to_string());
    }

    pub fn without_credentials(&self) {
        self.state.lock().unwrap().missing_credentials = true;
    }

    /// Filenames of every stored image, in upload order.
    pub fn uploaded(&self) -> Vec<String> {
        self.state.lock().unwrap().uploaded.clone()
    }
}

#[async_trait]
impl ImageHost for MockImageHost {
    fn check_credentials(&self) -> ProviderResult<()> {
        if self.state.lock().unwrap().missing_credentials {
            return Err(ProviderError::MissingCredentials(
                "mock image host credentials not set".to_string(),
            ));
        }
        Ok(())
    }

    async fn upload_image(&self, file: &UploadFile) -> ProviderResult<HostedImage> {
        self.check_credentials()?;
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.upload_error {
            return Err(ProviderError::ImageUploadFailed(message.clone()));
        }
        state.uploaded.push(file.filename.clone());
        let n = state.uploaded.len();
        Ok(HostedImage {
            url: format!("https://images.test/thumbnails/{}.jpg", n),
            public_id: format!("thumbnails/{}", n),
        })
    }
}
