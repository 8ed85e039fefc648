use std::io;

use thiserror::Error;
use tubely_core::AppError;

/// Failures of local media processing.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}")]
    ToolFailed { tool: String, status: String },

    #[error("unreadable probe output: {0}")]
    ProbeOutput(#[from] serde_json::Error),

    #[error("no streams found")]
    NoStreams,

    #[error("invalid dimensions {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("random name generation failed: {0}")]
    Random(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ProcessingError> for AppError {
    fn from(err: ProcessingError) -> Self {
        match err {
            ProcessingError::Io(e) => AppError::Internal(format!("IO error: {}", e)),
            ProcessingError::Random(msg) => AppError::Internal(msg),
            other => AppError::MediaProcessing(other.to_string()),
        }
    }
}
