//! Thumbnail images stored as local files and served under `/assets`.

use std::path::PathBuf;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tubely_core::constants::THUMBNAIL_CONTENT_TYPES;
use tubely_core::AppError;
use tubely_processing::{extension_for, normalize_media_type, random_file_stem};

pub struct ThumbnailService {
    assets_root: PathBuf,
    public_base_url: String,
}

impl ThumbnailService {
    pub fn new(assets_root: PathBuf, public_base_url: impl Into<String>) -> Self {
        Self {
            assets_root,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Write `body` to a new randomly named file and return its public URL.
    pub async fn save<S>(&self, content_type: &str, mut body: S) -> Result<String, AppError>
    where
        S: Stream<Item = Result<Bytes, AppError>> + Send + Unpin,
    {
        let media_type = normalize_media_type(content_type);
        if !THUMBNAIL_CONTENT_TYPES.contains(&media_type.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Invalid file type {:?}, only {} are allowed",
                content_type,
                THUMBNAIL_CONTENT_TYPES.join(", ")
            )));
        }
        let extension = extension_for(&media_type)
            .ok_or_else(|| AppError::BadRequest("Missing media subtype".to_string()))?;
        let file_name = format!("{}.{}", random_file_stem()?, extension);
        let path = self.assets_root.join(&file_name);

        // removed on drop until kept
        let guard = TempPath::try_from_path(&path)?;
        let mut file = tokio::fs::File::create(&path).await?;
        let mut size: u64 = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            size += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        guard
            .keep()
            .map_err(|e| AppError::Internal(format!("Failed to keep thumbnail: {}", e)))?;

        tracing::info!(file = %file_name, size_bytes = size, "Thumbnail stored");
        Ok(format!("{}/assets/{}", self.public_base_url, file_name))
    }
}
