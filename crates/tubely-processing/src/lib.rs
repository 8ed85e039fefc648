//! Tubely Processing Library
//!
//! The video upload pipeline: staging an upload to local disk, fast-start
//! remuxing with ffmpeg, probing geometry with ffprobe to classify orientation,
//! and pushing the result to object storage.

pub mod error;
pub mod naming;
pub mod video;

pub use error::ProcessingError;
pub use naming::{extension_for, normalize_media_type, random_file_stem};
pub use video::{
    classify_dimensions, AspectClassifier, FfmpegRemuxer, FfprobeProber, ProbeOutput,
    ProbeStream, Remuxer, UploadConfig, VideoProber, VideoUploadOrchestrator,
};
