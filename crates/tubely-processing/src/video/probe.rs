//! Stream geometry via ffprobe.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::ProcessingError;

/// The part of `ffprobe -print_format json -show_streams` we read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProbeOutput {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
}

/// Non-video streams carry no dimensions and read as `0x0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl ProbeOutput {
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            streams: vec![ProbeStream { width, height }],
        }
    }
}

pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeOutput, ProcessingError> {
    Ok(serde_json::from_slice(stdout)?)
}

#[async_trait]
pub trait VideoProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, ProcessingError>;
}

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

#[async_trait]
impl VideoProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<ProbeOutput, ProcessingError> {
        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| ProcessingError::Spawn {
                tool: self.ffprobe_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProcessingError::ToolFailed {
                tool: self.ffprobe_path.clone(),
                status: output.status.to_string(),
            });
        }

        parse_probe_output(&output.stdout)
    }
}
