//! Staging of incoming upload bodies on local disk.

use std::path::Path;
use std::time::Instant;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tubely_core::AppError;

const STAGED_PREFIX: &str = "tubely-upload";

/// Copy `body` into a fresh temporary file in `dir`.
///
/// The returned [`TempPath`] deletes the file when dropped. On any failure the
/// partial file is dropped, and therefore deleted, before returning.
pub async fn stage_upload<S>(dir: &Path, extension: &str, mut body: S) -> Result<TempPath, AppError>
where
    S: Stream<Item = Result<Bytes, AppError>> + Send + Unpin,
{
    let suffix = format!(".{}", extension);
    let named = tempfile::Builder::new()
        .prefix(STAGED_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)?;
    let (file, path) = named.into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let start = Instant::now();
    let mut size: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    drop(file);

    tracing::debug!(
        path = %path.display(),
        size_bytes = size,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Upload staged"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn ok(data: &'static [u8]) -> Result<Bytes, AppError> {
        Ok(Bytes::from_static(data))
    }

    #[tokio::test]
    async fn test_stage_writes_every_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let body = stream::iter(vec![ok(b"ftyp"), ok(b"mdat"), ok(b"moov")]);

        let staged = stage_upload(dir.path(), "mp4", body).await.unwrap();

        let name = staged.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("tubely-upload"));
        assert!(name.ends_with(".mp4"));
        assert_eq!(std::fs::read(&staged).unwrap(), b"ftypmdatmoov");

        let path = staged.to_path_buf();
        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_failed_body_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let body = stream::iter(vec![
            ok(b"ftyp"),
            Err(AppError::PayloadTooLarge("Video exceeds the upload limit".to_string())),
        ]);

        let err = stage_upload(dir.path(), "mp4", body).await.unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
