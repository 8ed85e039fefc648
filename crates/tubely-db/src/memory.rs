use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tubely_core::{AppError, Video};
use uuid::Uuid;

use crate::VideoRepository;

/// Keyed in-process store of video records.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as-is, replacing any record with the same id.
    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }

    async fn modify(&self, id: Uuid, change: impl FnOnce(&mut Video)) -> Result<Video, AppError> {
        let mut videos = self.videos.write().await;
        let stored = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

        change(stored);
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }
}

#[async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create_video(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
    ) -> Result<Video, AppError> {
        let video = Video::new(user_id, title, description);
        self.videos.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn set_video_url(&self, id: Uuid, video_url: &str) -> Result<Video, AppError> {
        self.modify(id, |video| video.video_url = Some(video_url.to_string()))
            .await
    }

    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError> {
        self.modify(id, |video| video.thumbnail_url = Some(thumbnail_url.to_string()))
            .await
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let mut videos: Vec<Video> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get() {
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();

        let created = repo
            .create_video(owner, "Boots".to_string(), "a trailer".to_string())
            .await
            .unwrap();
        let fetched = repo.get_video(created.id).await.unwrap().unwrap();

        assert_eq!(fetched, created);
        assert!(fetched.video_url.is_none());
        assert!(repo.get_video(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_field_updates_touch_only_their_field() {
        let repo = InMemoryVideoRepository::new();
        let owner = Uuid::new_v4();
        let video = repo
            .create_video(owner, "Boots".to_string(), "a trailer".to_string())
            .await
            .unwrap();

        repo.set_thumbnail_url(video.id, "http://localhost/assets/t.png")
            .await
            .unwrap();
        let updated = repo
            .set_video_url(video.id, "bucket,landscape/a.mp4")
            .await
            .unwrap();

        assert_eq!(updated.user_id, owner);
        assert_eq!(updated.title, "Boots");
        assert_eq!(updated.description, "a trailer");
        assert_eq!(updated.video_url.as_deref(), Some("bucket,landscape/a.mp4"));
        assert_eq!(
            updated.thumbnail_url.as_deref(),
            Some("http://localhost/assets/t.png")
        );
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(repo.get_video(video.id).await.unwrap().unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let repo = InMemoryVideoRepository::new();

        let err = repo
            .set_video_url(Uuid::new_v4(), "bucket,other/a.mp4")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = repo
            .set_thumbnail_url(Uuid::new_v4(), "http://localhost/assets/t.png")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner() {
        let repo = InMemoryVideoRepository::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.create_video(alice, "one".to_string(), String::new()).await.unwrap();
        repo.create_video(alice, "two".to_string(), String::new()).await.unwrap();
        repo.create_video(bob, "three".to_string(), String::new()).await.unwrap();

        let videos = repo.list_videos_for_user(alice).await.unwrap();
        assert_eq!(videos.len(), 2);
        assert!(videos.iter().all(|v| v.user_id == alice));
    }
}
