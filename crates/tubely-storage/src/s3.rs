use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::ObjectStore;
use tokio::sync::RwLock;

use crate::stream::stream_to_store;
use crate::traits::{validate_key, ByteReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;

/// S3 storage implementation
///
/// One `AmazonS3` client is built lazily per bucket and cached.
pub struct S3Storage {
    base: AmazonS3Builder,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `default_bucket` - bucket whose client is built eagerly, so credential
    ///   or endpoint problems surface at startup
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(
        default_bucket: &str,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        Self::with_builder(AmazonS3Builder::from_env(), default_bucket, region, endpoint_url)
    }

    /// Like [`S3Storage::new`], but every per-bucket client starts from `base`
    /// instead of the environment.
    pub fn with_builder(
        base: AmazonS3Builder,
        default_bucket: &str,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let storage = S3Storage {
            base,
            region,
            endpoint_url,
            stores: RwLock::new(HashMap::new()),
        };
        let store = storage.build_store(default_bucket)?;
        storage
            .stores
            .try_write()
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .insert(default_bucket.to_string(), Arc::new(store));
        Ok(storage)
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = self
            .base
            .clone()
            .with_region(self.region.clone())
            .with_bucket_name(bucket);

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    async fn store_for(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }

        let mut stores = self.stores.write().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }
        let store = Arc::new(self.build_store(bucket)?);
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        reader: ByteReader,
    ) -> StorageResult<u64> {
        validate_key(key)?;
        let store = self.store_for(bucket).await?;
        let start = Instant::now();

        let result = stream_to_store(
            store as Arc<dyn ObjectStore>,
            Path::from(key),
            content_type,
            reader,
        )
        .await;

        match result {
            Ok(size) => {
                tracing::info!(
                    bucket = %bucket,
                    key = %key,
                    content_type = %content_type,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload successful"
                );
                Ok(size)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                Err(e)
            }
        }
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        validate_key(key)?;
        let store = self.store_for(bucket).await?;
        let location = Path::from(key);

        let url = store
            .signed_url(Method::GET, &location, expires_in)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(url.to_string())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
