//! Presigned access to stored videos.

use std::time::Duration;

use tubely_core::{AppError, StorageReference, Video};

use crate::Storage;

/// Return `video` with its stored `bucket,key` reference replaced by a signed
/// GET URL valid for `expires_in`.
///
/// Records without a video pass through untouched. The stored record is never
/// rewritten with the signed URL.
pub async fn sign_video(
    storage: &dyn Storage,
    mut video: Video,
    expires_in: Duration,
) -> Result<Video, AppError> {
    let Some(raw) = video.video_url.as_deref() else {
        return Ok(video);
    };

    let reference: StorageReference = raw.parse().map_err(|e| {
        tracing::error!(video_id = %video.id, reference = %raw, "Corrupt storage reference");
        AppError::InvalidStorageReference(e)
    })?;

    let url = storage
        .presigned_get_url(reference.bucket(), reference.key(), expires_in)
        .await?;

    video.video_url = Some(url);
    Ok(video)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStorage;
    use uuid::Uuid;

    const EXPIRY: Duration = Duration::from_secs(15 * 60);

    fn video_with(reference: Option<&str>) -> Video {
        let mut video = Video::new(Uuid::new_v4(), "clip".to_string(), String::new());
        video.video_url = reference.map(str::to_string);
        video
    }

    #[tokio::test]
    async fn test_video_without_upload_passes_through() {
        let storage = MemoryStorage::new();
        let video = video_with(None);

        let signed = sign_video(&storage, video.clone(), EXPIRY).await.unwrap();

        assert_eq!(signed, video);
    }

    #[tokio::test]
    async fn test_reference_is_replaced_with_signed_url() {
        let storage = MemoryStorage::new();
        let video = video_with(Some("tubely-videos,landscape/abc.mp4"));

        let first = sign_video(&storage, video.clone(), EXPIRY).await.unwrap();
        let second = sign_video(&storage, video.clone(), EXPIRY).await.unwrap();

        for signed in [&first, &second] {
            let url = signed.video_url.as_deref().unwrap();
            assert!(url.contains("tubely-videos/landscape/abc.mp4"));
            assert!(url.contains("expires_in=900"));
        }
        assert_ne!(first.video_url, second.video_url);
        assert_eq!(video.video_url.as_deref(), Some("tubely-videos,landscape/abc.mp4"));
    }

    #[tokio::test]
    async fn test_malformed_reference_is_rejected() {
        let storage = MemoryStorage::new();
        for raw in ["no-separator", "a,b,c", ",key"] {
            let result = sign_video(&storage, video_with(Some(raw)), EXPIRY).await;
            assert!(
                matches!(result, Err(AppError::InvalidStorageReference(_))),
                "{raw:?} should fail"
            );
        }
    }
}
