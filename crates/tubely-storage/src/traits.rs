//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;
use tubely_core::{AppError, StorageBackend};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Presign failed: {0}")]
    PresignFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte source handed to [`Storage::put_object`].
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Storage abstraction trait
///
/// Keys are used verbatim; callers own the key layout. A key must be non-empty,
/// must not start with `/` and must not contain `..` segments.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Stream `reader` to `bucket/key`, recording `content_type` as object
    /// metadata. Returns the number of bytes written once the store has
    /// acknowledged the write.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        reader: ByteReader,
    ) -> StorageResult<u64>;

    /// Signed, time-limited GET URL for `bucket/key`.
    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    fn backend_type(&self) -> StorageBackend;
}

pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
