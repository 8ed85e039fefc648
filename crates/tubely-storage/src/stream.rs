use std::sync::Arc;

use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::{Attribute, Attributes, ObjectStore};
use tokio::io::AsyncWriteExt;

use crate::traits::{ByteReader, StorageError, StorageResult};

/// Copy `reader` into `path` through a buffered (multipart when large) writer.
///
/// On failure the in-flight multipart upload is aborted. Nothing that was
/// already committed is removed.
pub(crate) async fn stream_to_store(
    store: Arc<dyn ObjectStore>,
    path: Path,
    content_type: &str,
    mut reader: ByteReader,
) -> StorageResult<u64> {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());

    let mut writer = BufWriter::new(store, path).with_attributes(attributes);

    let written = match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(n) => n,
        Err(e) => {
            if let Err(abort_err) = writer.abort().await {
                tracing::warn!(error = %abort_err, "Failed to abort object upload");
            }
            return Err(StorageError::UploadFailed(e.to_string()));
        }
    };

    writer
        .shutdown()
        .await
        .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

    Ok(written)
}
