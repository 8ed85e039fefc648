//! Composite `bucket,key` reference persisted on a video record.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageReferenceError {
    #[error("expected exactly two comma-separated parts, got {0:?}")]
    WrongShape(String),

    #[error("bucket and key must be non-empty")]
    EmptyComponent,

    #[error("bucket and key must not contain ',': {0:?}")]
    Separator(String),
}

/// Where an uploaded object lives.
///
/// Serialized as `"<bucket>,<key>"`. Parsing accepts exactly two non-empty
/// components; construction refuses components that would not parse back.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageReference {
    bucket: String,
    key: String,
}

impl StorageReference {
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self, StorageReferenceError> {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() || key.is_empty() {
            return Err(StorageReferenceError::EmptyComponent);
        }
        for part in [&bucket, &key] {
            if part.contains(',') {
                return Err(StorageReferenceError::Separator(part.clone()));
            }
        }
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FromStr for StorageReference {
    type Err = StorageReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').collect();
        match parts.as_slice() {
            [bucket, key] => StorageReference::new(*bucket, *key),
            _ => Err(StorageReferenceError::WrongShape(s.to_string())),
        }
    }
}

impl Display for StorageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}
