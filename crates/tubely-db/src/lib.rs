//! Video record persistence.
//!
//! [`VideoRepository`] is the record collaborator used by the API and the
//! upload pipeline. [`PgVideoRepository`] backs it with PostgreSQL;
//! [`InMemoryVideoRepository`] keeps records in process for development and
//! tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tubely_core::{AppError, Video};
use uuid::Uuid;

pub use memory::InMemoryVideoRepository;
pub use postgres::PgVideoRepository;

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
    ) -> Result<Video, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Set only the stored video reference and return the updated record.
    /// Fails with `NotFound` when the row no longer exists.
    async fn set_video_url(&self, id: Uuid, video_url: &str) -> Result<Video, AppError>;

    /// Set only the thumbnail URL and return the updated record.
    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError>;

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError>;
}
