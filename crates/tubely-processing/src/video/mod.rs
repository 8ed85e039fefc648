//! Video upload processing

pub mod aspect;
pub mod orchestration;
pub mod probe;
pub mod remux;
pub mod staging;

pub use aspect::{classify_dimensions, AspectClassifier};
pub use orchestration::{UploadConfig, VideoUploadOrchestrator};
pub use probe::{FfprobeProber, ProbeOutput, ProbeStream, VideoProber};
pub use remux::{FfmpegRemuxer, Remuxer};
