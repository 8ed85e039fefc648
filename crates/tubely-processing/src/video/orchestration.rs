//! Video upload orchestration: stage → remux → classify → upload → record → presign.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::Stream;
use tempfile::TempPath;
use tubely_core::constants::VIDEO_CONTENT_TYPE;
use tubely_core::{AppError, StorageReference, Video};
use tubely_db::VideoRepository;
use tubely_storage::{sign_video, Storage};
use uuid::Uuid;

use super::aspect::AspectClassifier;
use super::probe::VideoProber;
use super::remux::Remuxer;
use super::staging::stage_upload;
use crate::naming::{extension_for, normalize_media_type, random_file_stem};

/// Where uploads go and how long returned URLs stay valid.
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub bucket: String,
    pub temp_dir: PathBuf,
    pub presign_expiry: Duration,
}

/// Runs the upload pipeline for one request at a time; shared across requests.
pub struct VideoUploadOrchestrator {
    videos: Arc<dyn VideoRepository>,
    storage: Arc<dyn Storage>,
    remuxer: Arc<dyn Remuxer>,
    classifier: AspectClassifier,
    config: UploadConfig,
}

impl VideoUploadOrchestrator {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        storage: Arc<dyn Storage>,
        remuxer: Arc<dyn Remuxer>,
        prober: Arc<dyn VideoProber>,
        config: UploadConfig,
    ) -> Self {
        Self {
            videos,
            storage,
            remuxer,
            classifier: AspectClassifier::new(prober),
            config,
        }
    }

    /// Load `video_id` and check that `user_id` owns it.
    pub async fn authorize(&self, user_id: Uuid, video_id: Uuid) -> Result<Video, AppError> {
        let video = self
            .videos
            .get_video(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

        if !video.is_owned_by(user_id) {
            tracing::debug!(video_id = %video_id, user_id = %user_id, "Upload by non-owner rejected");
            return Err(AppError::Unauthorized(
                "You are not the owner of this video".to_string(),
            ));
        }
        Ok(video)
    }

    /// Process an upload for an already authorized `video`.
    ///
    /// Both temporary files are removed on every exit path. If the object is
    /// stored but the record update fails, the object is left in place.
    #[tracing::instrument(skip(self, video, body), fields(video_id = %video.id, user_id = %video.user_id))]
    pub async fn upload<S>(
        &self,
        video: Video,
        content_type: &str,
        body: S,
    ) -> Result<Video, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>> + Send + Unpin,
    {
        let start = Instant::now();

        let media_type = normalize_media_type(content_type);
        if media_type != VIDEO_CONTENT_TYPE {
            return Err(AppError::BadRequest(format!(
                "Invalid file type {:?}, only {} is allowed",
                content_type, VIDEO_CONTENT_TYPE
            )));
        }
        let extension = extension_for(&media_type)
            .ok_or_else(|| AppError::BadRequest("Missing media subtype".to_string()))?;
        let file_name = format!("{}.{}", random_file_stem()?, extension);

        let staged = stage_upload(&self.config.temp_dir, extension, body).await?;

        let remuxed = TempPath::try_from_path(self.remuxer.remux(&staged).await?)?;

        let orientation = self.classifier.classify(&remuxed).await?;
        let key = format!("{}/{}", orientation, file_name);

        let file = tokio::fs::File::open(&remuxed).await?;
        let size = self
            .storage
            .put_object(&self.config.bucket, &key, &media_type, Box::pin(file))
            .await?;

        let reference = StorageReference::new(self.config.bucket.as_str(), key.as_str())?;
        let video = match self
            .videos
            .set_video_url(video.id, &reference.to_string())
            .await
        {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    bucket = %self.config.bucket,
                    key = %key,
                    "Record update failed after upload; object is orphaned"
                );
                return Err(e);
            }
        };

        tracing::info!(
            bucket = %self.config.bucket,
            key = %key,
            orientation = %orientation,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video upload complete"
        );

        drop(remuxed);
        drop(staged);

        sign_video(self.storage.as_ref(), video, self.config.presign_expiry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::probe::ProbeOutput;
    use crate::video::remux::remuxed_path;
    use crate::ProcessingError;
    use async_trait::async_trait;
    use futures::stream;
    use std::path::Path;
    use std::sync::Mutex;
    use tubely_core::ErrorMetadata;
    use tubely_db::InMemoryVideoRepository;
    use tubely_storage::MemoryStorage;

    const BUCKET: &str = "tubely-test";

    type Seen = Arc<Mutex<Vec<PathBuf>>>;

    /// Copies the input next to itself and records what it saw.
    struct CopyRemuxer {
        seen: Seen,
    }

    #[async_trait]
    impl Remuxer for CopyRemuxer {
        async fn remux(&self, input: &Path) -> Result<PathBuf, ProcessingError> {
            self.seen.lock().unwrap().push(input.to_path_buf());
            let output = remuxed_path(input);
            tokio::fs::copy(input, &output).await?;
            Ok(output)
        }
    }

    /// Exits non-zero like a tool that rejected its input.
    struct FailingRemuxer {
        seen: Seen,
    }

    #[async_trait]
    impl Remuxer for FailingRemuxer {
        async fn remux(&self, input: &Path) -> Result<PathBuf, ProcessingError> {
            self.seen.lock().unwrap().push(input.to_path_buf());
            Err(ProcessingError::ToolFailed {
                tool: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
            })
        }
    }

    struct FixedProber(ProbeOutput);

    #[async_trait]
    impl VideoProber for FixedProber {
        async fn probe(&self, path: &Path) -> Result<ProbeOutput, ProcessingError> {
            assert!(path.exists(), "probe ran on a missing file");
            Ok(self.0.clone())
        }
    }

    /// Accepts reads and creates, fails every update.
    struct BrokenUpdates(InMemoryVideoRepository);

    #[async_trait]
    impl VideoRepository for BrokenUpdates {
        async fn create_video(&self, user_id: Uuid, title: String, description: String) -> Result<Video, AppError> {
            self.0.create_video(user_id, title, description).await
        }
        async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
            self.0.get_video(id).await
        }
        async fn set_video_url(&self, _id: Uuid, _video_url: &str) -> Result<Video, AppError> {
            Err(AppError::Internal("connection reset".to_string()))
        }
        async fn set_thumbnail_url(&self, _id: Uuid, _thumbnail_url: &str) -> Result<Video, AppError> {
            Err(AppError::Internal("connection reset".to_string()))
        }
        async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
            self.0.list_videos_for_user(user_id).await
        }
    }

    struct Harness {
        orchestrator: VideoUploadOrchestrator,
        videos: Arc<dyn VideoRepository>,
        storage: Arc<MemoryStorage>,
        seen: Seen,
        temp_dir: tempfile::TempDir,
    }

    fn harness_with(
        videos: Arc<dyn VideoRepository>,
        failing_remux: bool,
        width: u32,
        height: u32,
    ) -> Harness {
        let storage = Arc::new(MemoryStorage::new());
        let seen = Seen::default();
        let remuxer: Arc<dyn Remuxer> = if failing_remux {
            Arc::new(FailingRemuxer { seen: seen.clone() })
        } else {
            Arc::new(CopyRemuxer { seen: seen.clone() })
        };
        let temp_dir = tempfile::tempdir().unwrap();
        let orchestrator = VideoUploadOrchestrator::new(
            videos.clone(),
            storage.clone(),
            remuxer,
            Arc::new(FixedProber(ProbeOutput::with_dimensions(width, height))),
            UploadConfig {
                bucket: BUCKET.to_string(),
                temp_dir: temp_dir.path().to_path_buf(),
                presign_expiry: Duration::from_secs(900),
            },
        );
        Harness {
            orchestrator,
            videos,
            storage,
            seen,
            temp_dir,
        }
    }

    fn harness(width: u32, height: u32) -> Harness {
        harness_with(Arc::new(InMemoryVideoRepository::new()), false, width, height)
    }

    fn body() -> impl Stream<Item = Result<Bytes, AppError>> + Send + Unpin {
        stream::iter(vec![
            Ok(Bytes::from_static(b"\x00\x00\x00\x18ftypmp42")),
            Ok(Bytes::from_static(b"mdat-payload")),
        ])
    }

    fn temp_entries(h: &Harness) -> usize {
        std::fs::read_dir(h.temp_dir.path()).unwrap().count()
    }

    async fn new_video(h: &Harness, owner: Uuid) -> Video {
        h.videos
            .create_video(owner, "Boots".to_string(), "a trailer".to_string())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_landscape_upload_end_to_end() {
        let h = harness(1920, 1080);
        let owner = Uuid::new_v4();
        let video = new_video(&h, owner).await;

        let authorized = h.orchestrator.authorize(owner, video.id).await.unwrap();
        let signed = h
            .orchestrator
            .upload(authorized, "video/mp4", body())
            .await
            .unwrap();

        let keys = h.storage.keys(BUCKET).await.unwrap();
        assert_eq!(keys.len(), 1);
        let key = &keys[0];
        assert!(key.starts_with("landscape/"));
        assert!(key.ends_with(".mp4"));

        let (bytes, content_type) = h.storage.object(BUCKET, key).await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"\x00\x00\x00\x18ftypmp42mdat-payload");
        assert_eq!(content_type, "video/mp4");

        let stored = h.videos.get_video(video.id).await.unwrap().unwrap();
        assert_eq!(stored.video_url, Some(format!("{},{}", BUCKET, key)));

        let url = signed.video_url.unwrap();
        assert!(!url.is_empty());
        assert!(url.contains(key.as_str()));

        assert_eq!(temp_entries(&h), 0);
    }

    #[tokio::test]
    async fn test_portrait_and_other_prefixes() {
        for (width, height, prefix) in [(1080, 1920, "portrait/"), (1000, 1000, "other/")] {
            let h = harness(width, height);
            let owner = Uuid::new_v4();
            let video = new_video(&h, owner).await;

            h.orchestrator.upload(video, "video/mp4", body()).await.unwrap();

            let keys = h.storage.keys(BUCKET).await.unwrap();
            assert!(keys[0].starts_with(prefix), "{} should start with {}", keys[0], prefix);
        }
    }

    #[tokio::test]
    async fn test_content_type_parameters_are_accepted() {
        let h = harness(1920, 1080);
        let video = new_video(&h, Uuid::new_v4()).await;

        let result = h
            .orchestrator
            .upload(video, "Video/MP4; codecs=\"avc1\"", body())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_non_mp4_is_rejected_before_staging() {
        let h = harness(1920, 1080);
        let video = new_video(&h, Uuid::new_v4()).await;

        let err = h
            .orchestrator
            .upload(video, "image/png", body())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.http_status_code(), 400);
        assert!(h.seen.lock().unwrap().is_empty());
        assert_eq!(temp_entries(&h), 0);
    }

    #[tokio::test]
    async fn test_non_owner_is_rejected() {
        let h = harness(1920, 1080);
        let video = new_video(&h, Uuid::new_v4()).await;

        let err = h
            .orchestrator
            .authorize(Uuid::new_v4(), video.id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_missing_video_is_not_found() {
        let h = harness(1920, 1080);

        let err = h
            .orchestrator
            .authorize(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_zero_width_fails_and_cleans_up() {
        let h = harness(0, 720);
        let owner = Uuid::new_v4();
        let video = new_video(&h, owner).await;

        let err = h
            .orchestrator
            .upload(video.clone(), "video/mp4", body())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MediaProcessing(_)));
        assert_eq!(err.http_status_code(), 500);

        let staged = h.seen.lock().unwrap()[0].clone();
        assert!(!staged.exists());
        assert!(!remuxed_path(&staged).exists());
        assert_eq!(temp_entries(&h), 0);

        assert!(h.storage.keys(BUCKET).await.unwrap().is_empty());
        assert_eq!(h.videos.get_video(video.id).await.unwrap().unwrap(), video);
    }

    #[tokio::test]
    async fn test_failed_record_update_leaves_orphaned_object() {
        let h = harness_with(
            Arc::new(BrokenUpdates(InMemoryVideoRepository::new())),
            false,
            1920,
            1080,
        );
        let video = new_video(&h, Uuid::new_v4()).await;

        let err = h
            .orchestrator
            .upload(video.clone(), "video/mp4", body())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(h.storage.keys(BUCKET).await.unwrap().len(), 1);
        assert!(h.videos.get_video(video.id).await.unwrap().unwrap().video_url.is_none());
        assert_eq!(temp_entries(&h), 0);
    }

    #[tokio::test]
    async fn test_body_error_aborts_before_remux() {
        let h = harness(1920, 1080);
        let video = new_video(&h, Uuid::new_v4()).await;
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"ftyp")),
            Err(AppError::BadRequest("Malformed multipart body".to_string())),
        ]);

        let err = h
            .orchestrator
            .upload(video, "video/mp4", failing)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(h.seen.lock().unwrap().is_empty());
        assert_eq!(temp_entries(&h), 0);
    }

    #[tokio::test]
    async fn test_remux_failure_cleans_up_and_leaves_record() {
        let h = harness_with(Arc::new(InMemoryVideoRepository::new()), true, 1920, 1080);
        let video = new_video(&h, Uuid::new_v4()).await;

        let err = h
            .orchestrator
            .upload(video.clone(), "video/mp4", body())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MediaProcessing(_)));
        assert_eq!(err.http_status_code(), 500);

        let staged = h.seen.lock().unwrap()[0].clone();
        assert!(!staged.exists());
        assert_eq!(temp_entries(&h), 0);
        assert!(h.storage.keys(BUCKET).await.unwrap().is_empty());
        assert_eq!(h.videos.get_video(video.id).await.unwrap().unwrap(), video);
    }

    #[tokio::test]
    async fn test_upload_keeps_fields_written_while_processing() {
        let h = harness(1920, 1080);
        let owner = Uuid::new_v4();
        let video = new_video(&h, owner).await;

        let authorized = h.orchestrator.authorize(owner, video.id).await.unwrap();
        h.videos
            .set_thumbnail_url(video.id, "http://localhost/assets/thumb.png")
            .await
            .unwrap();
        let signed = h
            .orchestrator
            .upload(authorized, "video/mp4", body())
            .await
            .unwrap();

        let stored = h.videos.get_video(video.id).await.unwrap().unwrap();
        assert_eq!(
            stored.thumbnail_url.as_deref(),
            Some("http://localhost/assets/thumb.png")
        );
        assert!(stored.video_url.unwrap().starts_with(BUCKET));
        assert_eq!(
            signed.thumbnail_url.as_deref(),
            Some("http://localhost/assets/thumb.png")
        );
    }
}
