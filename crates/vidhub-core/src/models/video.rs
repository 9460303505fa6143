use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Persisted video record.
///
/// `provider_video_id` and `playback_link` are written once at creation. The
/// thumbnail may arrive later, through the ingestion poll or a reconciliation
/// sweep; a record without one is eligible for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub category_id: Uuid,
    pub provider_video_id: String,
    pub playback_link: String,
    pub thumbnail_url: Option<String>,
    pub like_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn has_thumbnail(&self) -> bool {
        self.thumbnail_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }
}

/// Treat an empty or whitespace thumbnail as absent.
pub fn normalize_thumbnail(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

/// Fields needed to insert a video record
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub title: String,
    pub category_id: Uuid,
    pub provider_video_id: String,
    pub playback_link: String,
    pub thumbnail_url: Option<String>,
}

/// Request DTO for registering an ingested video
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateVideoRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Title must be between 1 and 255 characters"
    ))]
    pub title: String,
    pub category_id: Uuid,
    #[validate(length(min = 1, message = "provider_video_id cannot be empty"))]
    pub provider_video_id: String,
    #[validate(length(min = 1, message = "playback_link cannot be empty"))]
    pub playback_link: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl From<CreateVideoRequest> for NewVideo {
    fn from(req: CreateVideoRequest) -> Self {
        NewVideo {
            title: req.title.trim().to_string(),
            category_id: req.category_id,
            provider_video_id: req.provider_video_id,
            playback_link: req.playback_link,
            thumbnail_url: normalize_thumbnail(req.thumbnail_url),
        }
    }
}

/// Counter columns that can be incremented atomically
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    Likes,
    Views,
}

impl CounterField {
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::Likes => "like_count",
            CounterField::Views => "view_count",
        }
    }
}

/// Engagement action accepted by `PUT /videos/{id}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum VideoAction {
    IncrementViews,
    IncrementLike,
    DecrementLike,
}

impl VideoAction {
    /// Counter and delta applied by this action.
    pub fn counter_delta(&self) -> (CounterField, i64) {
        match self {
            VideoAction::IncrementViews => (CounterField::Views, 1),
            VideoAction::IncrementLike => (CounterField::Likes, 1),
            VideoAction::DecrementLike => (CounterField::Likes, -1),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateVideoRequest {
    pub action: VideoAction,
}

/// Paging parameters for video listings
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListVideosQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl ListVideosQuery {
    pub const MAX_LIMIT: i64 = 100;

    /// Clamp limit to 1..=100 and offset to >= 0.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video(thumbnail_url: Option<&str>) -> Video {
        Video {
            id: Uuid::new_v4(),
            title: "Launch".to_string(),
            category_id: Uuid::new_v4(),
            provider_video_id: "abc123".to_string(),
            playback_link: "https://streamtape.com/v/abc123".to_string(),
            thumbnail_url: thumbnail_url.map(str::to_string),
            like_count: 0,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_thumbnail_treats_empty_as_missing() {
        assert!(!sample_video(None).has_thumbnail());
        assert!(!sample_video(Some("")).has_thumbnail());
        assert!(!sample_video(Some("  ")).has_thumbnail());
        assert!(sample_video(Some("https://cdn/x.jpg")).has_thumbnail());
    }

    #[test]
    fn test_normalize_thumbnail() {
        assert_eq!(normalize_thumbnail(Some(String::new())), None);
        assert_eq!(normalize_thumbnail(None), None);
        assert_eq!(
            normalize_thumbnail(Some(" https://cdn/x.jpg ".to_string())),
            Some("https://cdn/x.jpg".to_string())
        );
    }

    #[test]
    fn test_video_action_deserializes_camel_case() {
        let req: UpdateVideoRequest =
            serde_json::from_str(r#"{"action":"decrementLike"}"#).unwrap();
        assert_eq!(req.action, VideoAction::DecrementLike);
        assert_eq!(req.action.counter_delta(), (CounterField::Likes, -1));

        let bad = serde_json::from_str::<UpdateVideoRequest>(r#"{"action":"explode"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_list_query_clamps() {
        let q = ListVideosQuery {
            limit: 1000,
            offset: -5,
        };
        assert_eq!(q.clamped(), (100, 0));
        let q = ListVideosQuery {
            limit: 0,
            offset: 40,
        };
        assert_eq!(q.clamped(), (1, 40));
    }

    #[test]
    fn test_create_request_into_new_video_trims() {
        let req = CreateVideoRequest {
            title: "  Launch  ".to_string(),
            category_id: Uuid::new_v4(),
            provider_video_id: "abc".to_string(),
            playback_link: "https://x".to_string(),
            thumbnail_url: Some(String::new()),
        };
        assert!(req.validate().is_ok());
        let new: NewVideo = req.into();
        assert_eq!(new.title, "Launch");
        assert_eq!(new.thumbnail_url, None);
    }
}
