//! Fast-start remuxing.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use crate::ProcessingError;

/// Appended to the input path to name the remuxed output.
pub const REMUX_SUFFIX: &str = ".processing";

/// Rewrites a container so playback metadata precedes the media data.
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Remux `input` and return the path of the new file. The caller owns the
    /// returned file.
    async fn remux(&self, input: &Path) -> Result<PathBuf, ProcessingError>;
}

pub fn remuxed_path(input: &Path) -> PathBuf {
    let mut path = OsString::from(input.as_os_str());
    path.push(REMUX_SUFFIX);
    PathBuf::from(path)
}

/// [`Remuxer`] backed by `ffmpeg -c copy -movflags faststart`.
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(input = %input.display()))]
    async fn remux(&self, input: &Path) -> Result<PathBuf, ProcessingError> {
        let output = remuxed_path(input);
        let start = Instant::now();

        let status = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| ProcessingError::Spawn {
                tool: self.ffmpeg_path.clone(),
                source,
            })?;

        if !status.success() {
            if let Err(e) = tokio::fs::remove_file(&output).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, output = %output.display(), "Failed to remove partial remux output");
                }
            }
            return Err(ProcessingError::ToolFailed {
                tool: self.ffmpeg_path.clone(),
                status: status.to_string(),
            });
        }

        tracing::debug!(
            output = %output.display(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Remux complete"
        );
        Ok(output)
    }
}
