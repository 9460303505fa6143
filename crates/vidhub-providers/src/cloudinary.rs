//! Cloudinary image host
//!
//! Thumbnails supplied by clients are stored with a signed upload. The
//! signature is the SHA-1 of the sorted `key=value` parameters joined by `&`,
//! followed by the API secret.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use vidhub_core::models::UploadFile;

use crate::traits::{HostedImage, ImageHost, ProviderError, ProviderResult};

const THUMBNAIL_FOLDER: &str = "thumbnails";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Cloudinary implementation of [`ImageHost`]
pub struct CloudinaryImageHost {
    http_client: Client,
    api_url: String,
    cloud_name: Option<String>,
    api_key: Option<String>,
    api_secret: Option<String>,
    upload_timeout: Duration,
}

impl Debug for CloudinaryImageHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryImageHost")
            .field("api_url", &self.api_url)
            .field("cloud_name", &self.cloud_name)
            .finish()
    }
}

impl CloudinaryImageHost {
    pub fn new(
        http_client: Client,
        api_url: impl Into<String>,
        cloud_name: Option<String>,
        api_key: Option<String>,
        api_secret: Option<String>,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            cloud_name,
            api_key,
            api_secret,
            upload_timeout,
        }
    }

    fn credentials(&self) -> ProviderResult<(&str, &str, &str)> {
        match (
            self.cloud_name.as_deref(),
            self.api_key.as_deref(),
            self.api_secret.as_deref(),
        ) {
            (Some(cloud), Some(key), Some(secret)) => Ok((cloud, key, secret)),
            _ => Err(ProviderError::MissingCredentials(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set"
                    .to_string(),
            )),
        }
    }
}

/// Signature over the signed upload parameters.
pub(crate) fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    fn check_credentials(&self) -> ProviderResult<()> {
        self.credentials().map(|_| ())
    }

    #[tracing::instrument(
        skip(self, file),
        fields(image_host = "cloudinary", filename = %file.filename, size = file.len())
    )]
    async fn upload_image(&self, file: &UploadFile) -> ProviderResult<HostedImage> {
        let (cloud_name, api_key, api_secret) = self.credentials()?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", THUMBNAIL_FOLDER), ("timestamp", &timestamp)],
            api_secret,
        );

        let mut part = Part::bytes(file.data.to_vec()).file_name(file.filename.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| ProviderError::ImageUploadFailed(e.to_string()))?;
        }
        let form = Form::new()
            .part("file", part)
            .text("api_key", api_key.to_string())
            .text("timestamp", timestamp)
            .text("folder", THUMBNAIL_FOLDER)
            .text("signature", signature);

        let url = format!("{}/v1_1/{}/image/upload", self.api_url, cloud_name);
        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::ImageUploadFailed))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ProviderError::ImageUploadFailed(format!(
                "{} - {}",
                status, message
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if uploaded.secure_url.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "image host returned no url".to_string(),
            ));
        }

        Ok(HostedImage {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
        })
    }
}
