//! Tubely Storage Library
//!
//! Object storage for uploaded videos: the [`Storage`] capability (streamed
//! object write plus presigned GET), an S3 backend, an in-process memory
//! backend, and [`sign_video`], which swaps a record's stored `bucket,key`
//! reference for a time-limited URL on the way out.
//!
//! Backends are addressed per call by bucket so that references written under
//! an older bucket still presign correctly.

pub mod factory;
pub mod memory;
pub mod presign;
pub mod s3;
mod stream;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use memory::MemoryStorage;
pub use presign::sign_video;
pub use s3::S3Storage;
pub use traits::{ByteReader, Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
