use std::sync::Arc;

use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use vidhub_core::models::{normalize_thumbnail, CounterField, NewVideo, Video};
use vidhub_core::AppError;

use super::map_constraint_error;

const VIDEO_COLUMNS: &str = "id, title, category_id, provider_video_id, playback_link, \
     thumbnail_url, like_count, view_count, created_at, updated_at";

/// Storage operations on video records
#[async_trait::async_trait]
pub trait VideoStore: Send + Sync {
    async fn create_video(&self, video: NewVideo) -> Result<Video, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Newest first.
    async fn list_videos(&self, limit: i64, offset: i64) -> Result<Vec<Video>, AppError>;

    async fn list_videos_by_category(&self, category_id: Uuid) -> Result<Vec<Video>, AppError>;

    /// Records whose thumbnail is NULL or empty.
    async fn find_videos_missing_thumbnail(&self) -> Result<Vec<Video>, AppError>;

    /// Replace the thumbnail. Returns `None` when the record no longer exists.
    async fn update_thumbnail(&self, id: Uuid, url: &str) -> Result<Option<Video>, AppError>;

    /// Add `delta` to a counter, clamped at zero.
    async fn increment_field(
        &self,
        id: Uuid,
        field: CounterField,
        delta: i64,
    ) -> Result<Option<Video>, AppError>;

    async fn delete_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;
}

/// Build the PostgreSQL-backed video store
pub fn create_video_store(pool: PgPool) -> Arc<dyn VideoStore> {
    Arc::new(PostgresVideoRepository::new(pool))
}

/// Repository for the `videos` table
#[derive(Clone)]
pub struct PostgresVideoRepository {
    pool: PgPool,
}

impl PostgresVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoStore for PostgresVideoRepository {
    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "insert", provider_video_id = %video.provider_video_id))]
    async fn create_video(&self, video: NewVideo) -> Result<Video, AppError> {
        let query = format!(
            r#"
            INSERT INTO videos (title, category_id, provider_video_id, playback_link, thumbnail_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {VIDEO_COLUMNS}
            "#
        );

        sqlx::query_as::<Postgres, Video>(&query)
            .bind(&video.title)
            .bind(video.category_id)
            .bind(&video.provider_video_id)
            .bind(&video.playback_link)
            .bind(normalize_thumbnail(video.thumbnail_url))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                map_constraint_error(
                    e,
                    "A video with this provider id already exists",
                    "Category does not exist",
                )
            })
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1");
        let video = sqlx::query_as::<Postgres, Video>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_videos(&self, limit: i64, offset: i64) -> Result<Vec<Video>, AppError> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        let videos = sqlx::query_as::<Postgres, Video>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_videos_by_category(&self, category_id: Uuid) -> Result<Vec<Video>, AppError> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE category_id = $1 ORDER BY created_at DESC"
        );
        let videos = sqlx::query_as::<Postgres, Video>(&query)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn find_videos_missing_thumbnail(&self) -> Result<Vec<Video>, AppError> {
        let query = format!(
            "SELECT {VIDEO_COLUMNS} FROM videos \
             WHERE thumbnail_url IS NULL OR btrim(thumbnail_url) = '' \
             ORDER BY created_at ASC"
        );
        let videos = sqlx::query_as::<Postgres, Video>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn update_thumbnail(&self, id: Uuid, url: &str) -> Result<Option<Video>, AppError> {
        let query = format!(
            r#"
            UPDATE videos
            SET thumbnail_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let video = sqlx::query_as::<Postgres, Video>(&query)
            .bind(id)
            .bind(normalize_thumbnail(Some(url.to_string())))
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn increment_field(
        &self,
        id: Uuid,
        field: CounterField,
        delta: i64,
    ) -> Result<Option<Video>, AppError> {
        let column = field.column();
        let query = format!(
            r#"
            UPDATE videos
            SET {column} = GREATEST({column} + $2, 0), updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let video = sqlx::query_as::<Postgres, Video>(&query)
            .bind(id)
            .bind(delta)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let query = format!("DELETE FROM videos WHERE id = $1 RETURNING {VIDEO_COLUMNS}");
        let video = sqlx::query_as::<Postgres, Video>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }
}
