//! Streamtape provider
//!
//! Every API response is wrapped in `{status, msg, result}`; a `status` other
//! than 200 is a failure even when the HTTP status is 200.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use vidhub_core::models::UploadFile;
use vidhub_core::ProviderBackend;

use crate::traits::{
    ProviderError, ProviderResult, ThumbnailStatus, UploadTarget, UploadedVideo, VideoProvider,
};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: i64,
    #[serde(default)]
    msg: Option<String>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn message(&self) -> String {
        self.msg
            .clone()
            .unwrap_or_else(|| format!("status {}", self.status))
    }
}

#[derive(Debug, Deserialize)]
struct UploadUrlResult {
    url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    id: String,
    url: String,
}

/// Streamtape implementation of [`VideoProvider`]
pub struct StreamtapeProvider {
    http_client: Client,
    api_url: String,
    login: Option<String>,
    key: Option<String>,
    metadata_timeout: Duration,
    upload_timeout: Duration,
}

impl Debug for StreamtapeProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StreamtapeProvider")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl StreamtapeProvider {
    pub fn new(
        http_client: Client,
        api_url: impl Into<String>,
        login: Option<String>,
        key: Option<String>,
        metadata_timeout: Duration,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            login,
            key,
            metadata_timeout,
            upload_timeout,
        }
    }

    fn credentials(&self) -> ProviderResult<(&str, &str)> {
        match (self.login.as_deref(), self.key.as_deref()) {
            (Some(login), Some(key)) => Ok((login, key)),
            _ => Err(ProviderError::MissingCredentials(
                "STREAMTAPE_LOGIN and STREAMTAPE_KEY must be set".to_string(),
            )),
        }
    }

    /// Authenticated GET against the API, decoding the envelope.
    async fn api_get<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
        wrap: fn(String) -> ProviderError,
    ) -> ProviderResult<Envelope<T>> {
        let (login, key) = self.credentials()?;
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("login", login), ("key", key)])
            .query(extra)
            .timeout(self.metadata_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, wrap))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(wrap(format!("{} - {}", status, error_text)));
        }

        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl VideoProvider for StreamtapeProvider {
    fn check_credentials(&self) -> ProviderResult<()> {
        self.credentials().map(|_| ())
    }

    #[tracing::instrument(skip(self), fields(provider = "streamtape"))]
    async fn request_upload_target(&self, filename: &str) -> ProviderResult<UploadTarget> {
        let envelope: Envelope<UploadUrlResult> = self
            .api_get("/file/ul", &[], ProviderError::UploadTargetFailed)
            .await?;

        if envelope.status != 200 {
            return Err(ProviderError::UploadTargetFailed(envelope.message()));
        }

        let destination = envelope
            .result
            .map(|r| r.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("missing upload url".to_string()))?;

        Ok(UploadTarget {
            destination,
            provider_video_id: None,
        })
    }

    #[tracing::instrument(
        skip(self, target, file),
        fields(provider = "streamtape", filename = %file.filename, size = file.len())
    )]
    async fn transmit(
        &self,
        target: &UploadTarget,
        file: &UploadFile,
    ) -> ProviderResult<UploadedVideo> {
        let mut part = Part::bytes(file.data.to_vec()).file_name(file.filename.clone());
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| ProviderError::TransmitFailed(e.to_string()))?;
        }
        let form = Form::new().part("file", part);

        let response = self
            .http_client
            .post(&target.destination)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::TransmitFailed))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::TransmitFailed))?;

        let envelope: Envelope<UploadResult> = serde_json::from_str(&body).map_err(|_| {
            tracing::error!(
                http_status = %status,
                body = %body,
                "Unparsable Streamtape upload response"
            );
            ProviderError::InvalidResponse(format!("unparsable upload response ({})", status))
        })?;

        if envelope.status != 200 {
            return Err(ProviderError::TransmitFailed(envelope.message()));
        }

        let uploaded = envelope
            .result
            .ok_or_else(|| ProviderError::InvalidResponse("missing upload result".to_string()))?;

        Ok(UploadedVideo {
            provider_video_id: uploaded.id,
            playback_link: uploaded.url,
        })
    }

    #[tracing::instrument(skip(self), fields(provider = "streamtape"))]
    async fn get_thumbnail(&self, provider_video_id: &str) -> ProviderResult<ThumbnailStatus> {
        let envelope: Envelope<String> = self
            .api_get(
                "/file/getsplash",
                &[("file", provider_video_id)],
                ProviderError::ThumbnailFailed,
            )
            .await?;

        if envelope.status != 200 {
            return Ok(ThumbnailStatus::Pending(envelope.message()));
        }

        match envelope.result.filter(|url| !url.trim().is_empty()) {
            Some(url) => Ok(ThumbnailStatus::Ready(url)),
            None => Ok(ThumbnailStatus::Pending("empty thumbnail url".to_string())),
        }
    }

    #[tracing::instrument(skip(self), fields(provider = "streamtape"))]
    async fn delete(&self, provider_video_id: &str) -> ProviderResult<()> {
        let envelope: Envelope<serde_json::Value> = self
            .api_get(
                "/file/delete",
                &[("file", provider_video_id)],
                ProviderError::DeleteFailed,
            )
            .await?;

        match envelope.status {
            200 => Ok(()),
            404 => Err(ProviderError::NotFound(provider_video_id.to_string())),
            _ => Err(ProviderError::DeleteFailed(envelope.message())),
        }
    }

    fn backend_type(&self) -> ProviderBackend {
        ProviderBackend::Streamtape
    }
}
