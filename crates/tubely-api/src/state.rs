//! Application state shared by every handler.

use std::sync::Arc;

use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::VideoUploadOrchestrator;
use tubely_storage::Storage;

use crate::auth::Authenticator;
use crate::services::ThumbnailService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    pub uploads: Arc<VideoUploadOrchestrator>,
    pub thumbnails: Arc<ThumbnailService>,
    pub authenticator: Arc<dyn Authenticator>,
}
