//! Tubely Core Library
//!
//! Domain models, the unified error taxonomy, and configuration shared by every
//! Tubely crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{CreateVideoRequest, Orientation, StorageReference, StorageReferenceError, Video};
