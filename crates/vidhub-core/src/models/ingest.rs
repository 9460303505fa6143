use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// File received from a client, handed to the ingestion workflow as-is.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadFile {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Outcome of an ingestion: provider identity plus the thumbnail if it was ready in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IngestResult {
    pub provider_video_id: String,
    pub playback_link: String,
    pub thumbnail_url: Option<String>,
}

/// A client-supplied thumbnail stored on the image host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ThumbnailUploadResult {
    pub thumbnail_url: String,
    /// Image host identifier of the stored image
    pub thumbnail_id: String,
    /// Echoed from the request when given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconciledVideo {
    pub id: Uuid,
    pub provider_video_id: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconcileFailure {
    pub id: Uuid,
    pub provider_video_id: String,
    pub reason: String,
}

/// Summary of one reconciliation sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconcileReport {
    /// Records found without a thumbnail
    pub scanned: usize,
    /// Records whose thumbnail was written during this sweep
    pub updated_count: usize,
    pub updated: Vec<ReconciledVideo>,
    pub failed: Vec<ReconcileFailure>,
}
