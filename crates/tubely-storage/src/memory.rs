//! In-process storage backend for development and tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{Attribute, Error as ObjectStoreError, ObjectStore, ObjectStoreExt};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::stream::stream_to_store;
use crate::traits::{validate_key, ByteReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;

/// One [`InMemory`] store per bucket, created on first write.
///
/// Presigned URLs use a `memory://` scheme and carry the expiry and a fresh
/// signature nonce; they are only meaningful to tests.
#[derive(Default)]
pub struct MemoryStorage {
    buckets: RwLock<HashMap<String, Arc<InMemory>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    async fn bucket(&self, bucket: &str) -> Arc<InMemory> {
        let mut buckets = self.buckets.write().await;
        buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()))
            .clone()
    }

    /// Stored bytes and content type of an object, if present.
    pub async fn object(&self, bucket: &str, key: &str) -> StorageResult<Option<(Bytes, String)>> {
        let Some(store) = self.buckets.read().await.get(bucket).cloned() else {
            return Ok(None);
        };
        let result = match store.get(&Path::from(key)).await {
            Ok(result) => result,
            Err(ObjectStoreError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(StorageError::BackendError(e.to_string())),
        };
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| (**v).to_string())
            .unwrap_or_default();
        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(Some((bytes, content_type)))
    }

    /// Every key currently stored in `bucket`.
    pub async fn keys(&self, bucket: &str) -> StorageResult<Vec<String>> {
        use futures::TryStreamExt;

        let Some(store) = self.buckets.read().await.get(bucket).cloned() else {
            return Ok(Vec::new());
        };
        let objects: Vec<_> = store
            .list(None)
            .try_collect()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        let mut keys: Vec<String> = objects.into_iter().map(|m| m.location.to_string()).collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        reader: ByteReader,
    ) -> StorageResult<u64> {
        validate_key(key)?;
        let store = self.bucket(bucket).await;
        let size =
            stream_to_store(store as Arc<dyn ObjectStore>, Path::from(key), content_type, reader)
                .await?;
        tracing::debug!(bucket = %bucket, key = %key, size_bytes = size, "Memory upload successful");
        Ok(size)
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        Ok(format!(
            "memory://{}/{}?expires_in={}&signature={}",
            bucket,
            key,
            expires_in.as_secs(),
            Uuid::new_v4().simple()
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
