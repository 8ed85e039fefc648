//! Orientation classification from probed geometry.

use std::path::Path;
use std::sync::Arc;

use tubely_core::Orientation;

use super::probe::{ProbeOutput, VideoProber};
use crate::ProcessingError;

/// Absolute tolerance on `width / height`.
const TOLERANCE: f64 = 0.05;
/// Absorbs rounding in the subtraction so a ratio exactly at the tolerance
/// edge still counts as inside.
const ROUNDING_SLACK: f64 = 1e-9;

const LANDSCAPE: f64 = 16.0 / 9.0;
const PORTRAIT: f64 = 9.0 / 16.0;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE + ROUNDING_SLACK
}

pub fn classify_ratio(ratio: f64) -> Orientation {
    if approx_eq(ratio, LANDSCAPE) {
        Orientation::Landscape
    } else if approx_eq(ratio, PORTRAIT) {
        Orientation::Portrait
    } else {
        Orientation::Other
    }
}

pub fn classify_dimensions(width: u32, height: u32) -> Result<Orientation, ProcessingError> {
    if width == 0 || height == 0 {
        return Err(ProcessingError::ZeroDimension { width, height });
    }
    Ok(classify_ratio(f64::from(width) / f64::from(height)))
}

/// Only the first stream is consulted.
pub fn classify_probe(probe: &ProbeOutput) -> Result<Orientation, ProcessingError> {
    let stream = probe.streams.first().ok_or(ProcessingError::NoStreams)?;
    classify_dimensions(stream.width, stream.height)
}

/// Probes a local file and derives its [`Orientation`].
#[derive(Clone)]
pub struct AspectClassifier {
    prober: Arc<dyn VideoProber>,
}

impl AspectClassifier {
    pub fn new(prober: Arc<dyn VideoProber>) -> Self {
        Self { prober }
    }

    pub async fn classify(&self, path: &Path) -> Result<Orientation, ProcessingError> {
        let probe = self.prober.probe(path).await?;
        let orientation = classify_probe(&probe)?;
        if let Some(stream) = probe.streams.first() {
            tracing::debug!(
                width = stream.width,
                height = stream.height,
                orientation = %orientation,
                "Classified video orientation"
            );
        }
        Ok(orientation)
    }
}
