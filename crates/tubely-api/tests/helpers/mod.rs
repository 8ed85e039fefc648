//! Test helpers: an in-process router over in-memory collaborators.
//!
//! Run with `cargo test -p tubely-api`. No database, object store or ffmpeg
//! install is needed; the remuxer copies its input and the prober reports
//! fixed dimensions.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tempfile::TempDir;
use tubely_api::auth::JwtAuthenticator;
use tubely_api::services::ThumbnailService;
use tubely_api::setup::routes;
use tubely_api::state::AppState;
use tubely_core::{Config, StorageBackend, Video};
use tubely_db::{InMemoryVideoRepository, VideoRepository};
use tubely_processing::video::remux::remuxed_path;
use tubely_processing::{
    ProbeOutput, ProcessingError, Remuxer, UploadConfig, VideoProber,
    VideoUploadOrchestrator,
};
use tubely_storage::MemoryStorage;
use uuid::Uuid;

pub const TEST_BUCKET: &str = "tubely-test";
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const TEST_BASE_URL: &str = "http://localhost:8091";

/// Copies the staged file to the remux path and counts calls.
#[derive(Default)]
pub struct CopyRemuxer {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Remuxer for CopyRemuxer {
    async fn remux(&self, input: &Path) -> Result<PathBuf, ProcessingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let output = remuxed_path(input);
        tokio::fs::copy(input, &output).await?;
        Ok(output)
    }
}

/// Reports a single stream of the configured size.
pub struct FixedProber {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
impl VideoProber for FixedProber {
    async fn probe(&self, _path: &Path) -> Result<ProbeOutput, ProcessingError> {
        Ok(ProbeOutput::with_dimensions(self.width, self.height))
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub videos: Arc<InMemoryVideoRepository>,
    pub storage: Arc<MemoryStorage>,
    pub remuxer: Arc<CopyRemuxer>,
    pub authenticator: JwtAuthenticator,
    pub upload_dir: TempDir,
    pub assets_dir: TempDir,
}

fn test_config(upload_dir: &Path, assets_dir: &Path) -> Config {
    Config {
        server_port: 8091,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        jwt_secret: TEST_JWT_SECRET.to_string(),
        database_url: None,
        db_max_connections: 1,
        db_timeout_seconds: 5,
        storage_backend: StorageBackend::Memory,
        s3_bucket: Some(TEST_BUCKET.to_string()),
        s3_region: None,
        s3_endpoint: None,
        presign_expiry: Duration::from_secs(15 * 60),
        assets_root: assets_dir.to_path_buf(),
        public_base_url: TEST_BASE_URL.to_string(),
        upload_temp_dir: upload_dir.to_path_buf(),
        ffmpeg_path: "ffmpeg".to_string(),
        ffprobe_path: "ffprobe".to_string(),
        max_video_size_bytes: 1024 * 1024,
        max_thumbnail_size_bytes: 64 * 1024,
    }
}

/// Build an app whose prober reports a `width`x`height` video.
pub fn setup_test_app(width: u32, height: u32) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let assets_dir = tempfile::tempdir().expect("Failed to create assets dir");
    let config = test_config(upload_dir.path(), assets_dir.path());

    let videos = Arc::new(InMemoryVideoRepository::new());
    let storage = Arc::new(MemoryStorage::new());
    let remuxer = Arc::new(CopyRemuxer::default());

    let uploads = Arc::new(VideoUploadOrchestrator::new(
        videos.clone(),
        storage.clone(),
        remuxer.clone(),
        Arc::new(FixedProber { width, height }),
        UploadConfig {
            bucket: TEST_BUCKET.to_string(),
            temp_dir: upload_dir.path().to_path_buf(),
            presign_expiry: config.presign_expiry,
        },
    ));

    let state = Arc::new(AppState {
        config: config.clone(),
        videos: videos.clone(),
        storage: storage.clone(),
        uploads,
        thumbnails: Arc::new(ThumbnailService::new(
            assets_dir.path().to_path_buf(),
            TEST_BASE_URL,
        )),
        authenticator: Arc::new(JwtAuthenticator::new(TEST_JWT_SECRET)),
    });

    let app = routes::setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        videos,
        storage,
        remuxer,
        authenticator: JwtAuthenticator::new(TEST_JWT_SECRET),
        upload_dir,
        assets_dir,
    }
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn bearer(&self, user_id: Uuid) -> String {
        let token = self
            .authenticator
            .issue(user_id, Duration::from_secs(3600))
            .expect("Failed to issue token");
        format!("Bearer {}", token)
    }

    pub async fn create_video(&self, user_id: Uuid) -> Video {
        self.videos
            .create_video(user_id, "Boots".to_string(), "A pair of boots".to_string())
            .await
            .expect("Failed to create video")
    }

    pub async fn stored_video(&self, id: Uuid) -> Video {
        self.videos
            .get_video(id)
            .await
            .expect("Failed to read video")
            .expect("Video vanished")
    }

    /// Files left behind in the upload staging directory.
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(self.upload_dir.path())
            .expect("Failed to read upload dir")
            .count()
    }
}

pub fn file_form(field: &str, bytes: Vec<u8>, file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(bytes))
        .file_name(file_name)
        .mime_type(mime_type);
    MultipartForm::new().add_part(field, part)
}

/// Enough bytes to look like an MP4 to anything that only copies it.
pub fn fake_mp4() -> Vec<u8> {
    let mut data = b"\x00\x00\x00\x18ftypmp42".to_vec();
    data.extend(std::iter::repeat(0u8).take(4096));
    data
}
