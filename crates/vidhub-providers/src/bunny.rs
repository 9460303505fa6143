//! Bunny Stream provider
//!
//! Videos live in a library. Creating the video object returns its `guid`,
//! the payload is then PUT to the same resource. Encoding runs asynchronously;
//! the thumbnail is served from the library's CDN host once encoding is done.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use vidhub_core::models::UploadFile;
use vidhub_core::ProviderBackend;

use crate::traits::{
    ProviderError, ProviderResult, ThumbnailStatus, UploadTarget, UploadedVideo, VideoProvider,
};

const PLAYBACK_BASE_URL: &str = "https://iframe.mediadelivery.net/play";

// Encoding states reported in the `status` field
const STATUS_FINISHED: i32 = 3;
const STATUS_RESOLUTION_FINISHED: i32 = 4;
const STATUS_FAILED: i32 = 5;
const STATUS_UPLOAD_FAILED: i32 = 6;

#[derive(Debug, Deserialize)]
struct CreatedVideo {
    guid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetails {
    status: i32,
    #[serde(default)]
    thumbnail_file_name: Option<String>,
    #[serde(default)]
    encode_progress: Option<i32>,
}

/// Bunny Stream implementation of [`VideoProvider`]
pub struct BunnyProvider {
    http_client: Client,
    api_url: String,
    api_key: Option<String>,
    library_id: Option<String>,
    cdn_hostname: Option<String>,
    metadata_timeout: Duration,
    upload_timeout: Duration,
}

impl Debug for BunnyProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("BunnyProvider")
            .field("api_url", &self.api_url)
            .field("library_id", &self.library_id)
            .finish()
    }
}

impl BunnyProvider {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http_client: Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        library_id: Option<String>,
        cdn_hostname: Option<String>,
        metadata_timeout: Duration,
        upload_timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key,
            library_id,
            cdn_hostname,
            metadata_timeout,
            upload_timeout,
        }
    }

    fn credentials(&self) -> ProviderResult<(&str, &str)> {
        match (self.api_key.as_deref(), self.library_id.as_deref()) {
            (Some(key), Some(library)) => Ok((key, library)),
            _ => Err(ProviderError::MissingCredentials(
                "BUNNY_API_KEY and BUNNY_LIBRARY_ID must be set".to_string(),
            )),
        }
    }

    fn cdn_hostname(&self) -> ProviderResult<&str> {
        self.cdn_hostname.as_deref().ok_or_else(|| {
            ProviderError::MissingCredentials("BUNNY_CDN_HOSTNAME must be set".to_string())
        })
    }

    async fn put_payload(
        &self,
        api_key: &str,
        destination: &str,
        file: &UploadFile,
    ) -> ProviderResult<()> {
        let response = self
            .http_client
            .put(destination)
            .header("AccessKey", api_key)
            .header("content-type", "application/octet-stream")
            .body(file.data.clone())
            .timeout(self.upload_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::TransmitFailed))?;

        if !response.status().is_success() {
            return Err(ProviderError::TransmitFailed(error_text(response).await));
        }
        Ok(())
    }

    fn video_url(&self, library_id: &str, guid: &str) -> String {
        format!("{}/library/{}/videos/{}", self.api_url, library_id, guid)
    }

    fn playback_link(library_id: &str, guid: &str) -> String {
        format!("{}/{}/{}", PLAYBACK_BASE_URL, library_id, guid)
    }
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    format!("{} - {}", status, body)
}

#[async_trait]
impl VideoProvider for BunnyProvider {
    /// The CDN host counts as a credential: thumbnails resolve through it.
    fn check_credentials(&self) -> ProviderResult<()> {
        self.credentials()?;
        self.cdn_hostname().map(|_| ())
    }

    #[tracing::instrument(skip(self), fields(provider = "bunny"))]
    async fn request_upload_target(&self, filename: &str) -> ProviderResult<UploadTarget> {
        let (api_key, library_id) = self.credentials()?;
        let url = format!("{}/library/{}/videos", self.api_url, library_id);

        let response = self
            .http_client
            .post(&url)
            .header("AccessKey", api_key)
            .json(&json!({ "title": filename }))
            .timeout(self.metadata_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::UploadTargetFailed))?;

        if !response.status().is_success() {
            return Err(ProviderError::UploadTargetFailed(error_text(response).await));
        }

        let created: CreatedVideo = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if created.guid.is_empty() {
            return Err(ProviderError::InvalidResponse("empty video guid".to_string()));
        }

        Ok(UploadTarget {
            destination: self.video_url(library_id, &created.guid),
            provider_video_id: Some(created.guid),
        })
    }

    #[tracing::instrument(
        skip(self, target, file),
        fields(provider = "bunny", filename = %file.filename, size = file.len())
    )]
    async fn transmit(
        &self,
        target: &UploadTarget,
        file: &UploadFile,
    ) -> ProviderResult<UploadedVideo> {
        let (api_key, library_id) = self.credentials()?;
        let guid = target.provider_video_id.clone().ok_or_else(|| {
            ProviderError::InvalidResponse("upload target has no video guid".to_string())
        })?;

        if let Err(e) = self.put_payload(api_key, &target.destination, file).await {
            // Remove the empty video object created by the handshake
            tracing::warn!(guid = %guid, error = %e, "Upload failed, removing video object");
            if let Err(delete_err) = self.delete(&guid).await {
                tracing::warn!(
                    guid = %guid,
                    error = %delete_err,
                    "Failed to remove video object after a failed upload"
                );
            }
            return Err(e);
        }

        Ok(UploadedVideo {
            playback_link: Self::playback_link(library_id, &guid),
            provider_video_id: guid,
        })
    }

    #[tracing::instrument(skip(self), fields(provider = "bunny"))]
    async fn get_thumbnail(&self, provider_video_id: &str) -> ProviderResult<ThumbnailStatus> {
        let (api_key, library_id) = self.credentials()?;

        let response = self
            .http_client
            .get(self.video_url(library_id, provider_video_id))
            .header("AccessKey", api_key)
            .timeout(self.metadata_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::ThumbnailFailed))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(provider_video_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(ProviderError::ThumbnailFailed(error_text(response).await));
        }

        let details: VideoDetails = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        match details.status {
            STATUS_FAILED | STATUS_UPLOAD_FAILED => Err(ProviderError::ProcessingFailed(format!(
                "encoding status {}",
                details.status
            ))),
            STATUS_FINISHED | STATUS_RESOLUTION_FINISHED => {
                match details.thumbnail_file_name.filter(|name| !name.is_empty()) {
                    Some(file_name) => {
                        let cdn_host = self.cdn_hostname()?;
                        Ok(ThumbnailStatus::Ready(format!(
                            "https://{}/{}/{}",
                            cdn_host, provider_video_id, file_name
                        )))
                    }
                    None => Ok(ThumbnailStatus::Pending(
                        "encoded but no thumbnail yet".to_string(),
                    )),
                }
            }
            status => Ok(ThumbnailStatus::Pending(format!(
                "encoding status {} ({}%)",
                status,
                details.encode_progress.unwrap_or(0)
            ))),
        }
    }

    #[tracing::instrument(skip(self), fields(provider = "bunny"))]
    async fn delete(&self, provider_video_id: &str) -> ProviderResult<()> {
        let (api_key, library_id) = self.credentials()?;

        let response = self
            .http_client
            .delete(self.video_url(library_id, provider_video_id))
            .header("AccessKey", api_key)
            .timeout(self.metadata_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::from_request(e, ProviderError::DeleteFailed))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(provider_video_id.to_string())),
            _ => Err(ProviderError::DeleteFailed(error_text(response).await)),
        }
    }

    fn backend_type(&self) -> ProviderBackend {
        ProviderBackend::Bunny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mockito::{Matcher, Server};

    const GUID: &str = "7c1d4a1e-0000-4000-8000-000000000001";

    fn provider(server: &Server) -> BunnyProvider {
        BunnyProvider::new(
            Client::new(),
            server.url(),
            Some("bunny-key".to_string()),
            Some("4242".to_string()),
            Some("vz-test.b-cdn.net".to_string()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_create_then_put_payload() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/library/4242/videos")
            .match_header("AccessKey", "bunny-key")
            .match_body(Matcher::Json(serde_json::json!({ "title": "clip.mp4" })))
            .with_status(200)
            .with_body(format!(r#"{{"guid":"{}","title":"clip.mp4","status":0}}"#, GUID))
            .create_async()
            .await;
        let put = server
            .mock("PUT", format!("/library/4242/videos/{}", GUID).as_str())
            .match_header("AccessKey", "bunny-key")
            .match_body("payload")
            .with_status(200)
            .with_body(r#"{"success":true,"message":"OK","statusCode":200}"#)
            .create_async()
            .await;

        let provider = provider(&server);
        let target = provider.request_upload_target("clip.mp4").await.unwrap();
        assert_eq!(target.provider_video_id.as_deref(), Some(GUID));

        let file = UploadFile {
            filename: "clip.mp4".to_string(),
            content_type: None,
            data: Bytes::from_static(b"payload"),
        };
        let uploaded = provider.transmit(&target, &file).await.unwrap();
        assert_eq!(uploaded.provider_video_id, GUID);
        assert_eq!(
            uploaded.playback_link,
            format!("https://iframe.mediadelivery.net/play/4242/{}", GUID)
        );

        create.assert_async().await;
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_put_removes_created_video() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", format!("/library/4242/videos/{}", GUID).as_str())
            .with_status(500)
            .with_body("storage unavailable")
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", format!("/library/4242/videos/{}", GUID).as_str())
            .match_header("AccessKey", "bunny-key")
            .with_status(200)
            .create_async()
            .await;

        let provider = provider(&server);
        let target = UploadTarget {
            destination: provider.video_url("4242", GUID),
            provider_video_id: Some(GUID.to_string()),
        };
        let file = UploadFile {
            filename: "clip.mp4".to_string(),
            content_type: None,
            data: Bytes::from_static(b"payload"),
        };

        let err = provider.transmit(&target, &file).await.unwrap_err();
        assert!(matches!(err, ProviderError::TransmitFailed(_)));
        put.assert_async().await;
        delete.assert_async().await;
    }

    #[test]
    fn test_check_credentials_requires_cdn_hostname() {
        let server_url = "http://127.0.0.1:1";
        let complete = BunnyProvider::new(
            Client::new(),
            server_url,
            Some("bunny-key".to_string()),
            Some("4242".to_string()),
            Some("vz-test.b-cdn.net".to_string()),
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        assert!(complete.check_credentials().is_ok());

        let no_cdn = BunnyProvider::new(
            Client::new(),
            server_url,
            Some("bunny-key".to_string()),
            Some("4242".to_string()),
            None,
            Duration::from_secs(5),
            Duration::from_secs(5),
        );
        assert!(matches!(
            no_cdn.check_credentials(),
            Err(ProviderError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejected() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/library/4242/videos")
            .with_status(401)
            .with_body(r#"{"message":"Unauthorized"}"#)
            .create_async()
            .await;

        let err = provider(&server)
            .request_upload_target("clip.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UploadTargetFailed(_)));
    }

    #[tokio::test]
    async fn test_thumbnail_follows_encoding_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/library/4242/videos/encoding")
            .with_status(200)
            .with_body(r#"{"status":2,"encodeProgress":40,"thumbnailFileName":null}"#)
            .create_async()
            .await;
        server
            .mock("GET", format!("/library/4242/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(r#"{"status":4,"encodeProgress":100,"thumbnailFileName":"thumbnail.jpg"}"#)
            .create_async()
            .await;

        let provider = provider(&server);
        assert_eq!(
            provider.get_thumbnail("encoding").await.unwrap(),
            ThumbnailStatus::Pending("encoding status 2 (40%)".to_string())
        );
        assert_eq!(
            provider.get_thumbnail(GUID).await.unwrap(),
            ThumbnailStatus::Ready(format!("https://vz-test.b-cdn.net/{}/thumbnail.jpg", GUID))
        );
    }

    #[tokio::test]
    async fn test_thumbnail_failed_encoding() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", format!("/library/4242/videos/{}", GUID).as_str())
            .with_status(200)
            .with_body(r#"{"status":5}"#)
            .create_async()
            .await;

        let err = provider(&server).get_thumbnail(GUID).await.unwrap_err();
        assert!(matches!(err, ProviderError::ProcessingFailed(_)));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/library/4242/videos/missing")
            .with_status(404)
            .create_async()
            .await;

        let err = provider(&server).delete("missing").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }
}
