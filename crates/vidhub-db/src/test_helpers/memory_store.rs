//! In-memory implementation of [`VideoStore`] and [`CategoryStore`]
//!
//! Both traits share one state so category references behave like the
//! foreign key in the `videos` table.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;
use vidhub_core::models::{normalize_thumbnail, Category, CounterField, NewVideo, Video};
use vidhub_core::AppError;

use crate::db::{CategoryStore, VideoStore};

#[derive(Default)]
struct State {
    videos: HashMap<Uuid, Video>,
    categories: HashMap<Uuid, Category>,
    /// Records that disappear right before their thumbnail is written
    vanish_on_update: HashSet<Uuid>,
    /// Records whose thumbnail write fails with a database-style error
    fail_update: HashSet<Uuid>,
    fail_missing_query: bool,
    thumbnail_writes: Vec<(Uuid, String)>,
}

/// Mock store for testing without database
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category directly, bypassing validation.
    pub fn add_category(&self, name: &str) -> Category {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .unwrap()
            .categories
            .insert(category.id, category.clone());
        category
    }

    /// Insert a video directly. Each call is one second newer than the last.
    pub fn add_video(
        &self,
        category_id: Uuid,
        provider_video_id: &str,
        thumbnail_url: Option<&str>,
    ) -> Video {
        let mut state = self.state.lock().unwrap();
        let created_at = Utc::now() + Duration::seconds(state.videos.len() as i64);
        let video = Video {
            id: Uuid::new_v4(),
            title: format!("Video {}", provider_video_id),
            category_id,
            provider_video_id: provider_video_id.to_string(),
            playback_link: format!("https://provider.test/v/{}", provider_video_id),
            thumbnail_url: thumbnail_url.map(str::to_string),
            like_count: 0,
            view_count: 0,
            created_at,
            updated_at: created_at,
        };
        state.videos.insert(video.id, video.clone());
        video
    }

    pub fn video(&self, id: Uuid) -> Option<Video> {
        self.state.lock().unwrap().videos.get(&id).cloned()
    }

    pub fn video_count(&self) -> usize {
        self.state.lock().unwrap().videos.len()
    }

    /// Every `(id, url)` passed to `update_thumbnail`, in call order.
    pub fn thumbnail_writes(&self) -> Vec<(Uuid, String)> {
        self.state.lock().unwrap().thumbnail_writes.clone()
    }

    /// Simulate the record being deleted between the sweep query and the write.
    pub fn vanish_on_update(&self, id: Uuid) {
        self.state.lock().unwrap().vanish_on_update.insert(id);
    }

    pub fn fail_thumbnail_update(&self, id: Uuid) {
        self.state.lock().unwrap().fail_update.insert(id);
    }

    pub fn fail_missing_thumbnail_query(&self) {
        self.state.lock().unwrap().fail_missing_query = true;
    }
}

fn newest_first(mut videos: Vec<Video>) -> Vec<Video> {
    videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    videos
}

#[async_trait]
impl VideoStore for MemoryStore {
    async fn create_video(&self, video: NewVideo) -> Result<Video, AppError> {
        let mut state = self.state.lock().unwrap();
        if !state.categories.contains_key(&video.category_id) {
            return Err(AppError::BadRequest("Category does not exist".to_string()));
        }
        if state
            .videos
            .values()
            .any(|v| v.provider_video_id == video.provider_video_id)
        {
            return Err(AppError::Conflict(
                "A video with this provider id already exists".to_string(),
            ));
        }
        let created_at = Utc::now() + Duration::seconds(state.videos.len() as i64);
        let record = Video {
            id: Uuid::new_v4(),
            title: video.title,
            category_id: video.category_id,
            provider_video_id: video.provider_video_id,
            playback_link: video.playback_link,
            thumbnail_url: normalize_thumbnail(video.thumbnail_url),
            like_count: 0,
            view_count: 0,
            created_at,
            updated_at: created_at,
        };
        state.videos.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.video(id))
    }

    async fn list_videos(&self, limit: i64, offset: i64) -> Result<Vec<Video>, AppError> {
        let all: Vec<Video> = self.state.lock().unwrap().videos.values().cloned().collect();
        Ok(newest_first(all)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_videos_by_category(&self, category_id: Uuid) -> Result<Vec<Video>, AppError> {
        let matching: Vec<Video> = self
            .state
            .lock()
            .unwrap()
            .videos
            .values()
            .filter(|v| v.category_id == category_id)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn find_videos_missing_thumbnail(&self) -> Result<Vec<Video>, AppError> {
        let state = self.state.lock().unwrap();
        if state.fail_missing_query {
            return Err(AppError::Internal("videos table unavailable".to_string()));
        }
        let mut missing: Vec<Video> = state
            .videos
            .values()
            .filter(|v| !v.has_thumbnail())
            .cloned()
            .collect();
        missing.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(missing)
    }

    async fn update_thumbnail(&self, id: Uuid, url: &str) -> Result<Option<Video>, AppError> {
        let mut state = self.state.lock().unwrap();
        state.thumbnail_writes.push((id, url.to_string()));
        if state.fail_update.contains(&id) {
            return Err(AppError::Internal("write rejected".to_string()));
        }
        if state.vanish_on_update.remove(&id) {
            state.videos.remove(&id);
            return Ok(None);
        }
        Ok(state.videos.get_mut(&id).map(|video| {
            video.thumbnail_url = normalize_thumbnail(Some(url.to_string()));
            video.updated_at = Utc::now();
            video.clone()
        }))
    }

    async fn increment_field(
        &self,
        id: Uuid,
        field: CounterField,
        delta: i64,
    ) -> Result<Option<Video>, AppError> {
        let mut state = self.state.lock().unwrap();
        Ok(state.videos.get_mut(&id).map(|video| {
            let counter = match field {
                CounterField::Likes => &mut video.like_count,
                CounterField::Views => &mut video.view_count,
            };
            *counter = (*counter + delta).max(0);
            video.updated_at = Utc::now();
            video.clone()
        }))
    }

    async fn delete_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.state.lock().unwrap().videos.remove(&id))
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn create_category(&self, name: &str) -> Result<Category, AppError> {
        {
            let state = self.state.lock().unwrap();
            if state.categories.values().any(|c| c.name == name) {
                return Err(AppError::Conflict(format!(
                    "Category '{}' already exists",
                    name
                )));
            }
        }
        Ok(self.add_category(name))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories: Vec<Category> = self
            .state
            .lock()
            .unwrap()
            .categories
            .values()
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        Ok(self.state.lock().unwrap().categories.get(&id).cloned())
    }

    async fn update_category(&self, id: Uuid, name: &str) -> Result<Option<Category>, AppError> {
        let mut state = self.state.lock().unwrap();
        if state
            .categories
            .values()
            .any(|c| c.name == name && c.id != id)
        {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(state.categories.get_mut(&id).map(|category| {
            category.name = name.to_string();
            category.updated_at = Utc::now();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.videos.values().any(|v| v.category_id == id) {
            return Err(AppError::BadRequest(
                "Category is still used by videos".to_string(),
            ));
        }
        Ok(state.categories.remove(&id))
    }
}
