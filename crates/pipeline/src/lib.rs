//! Video and image processing pipeline.
//!
//! Connects the pure analysis in `formcheck-core` to its collaborators:
//! video decoding (`ffmpeg`), pose estimation (an HTTP sidecar) and
//! progress reporting.

pub mod error;
pub mod estimate;
pub mod estimator;
pub mod ffmpeg;
pub mod position;
pub mod runner;
pub mod source;

pub use error::PipelineError;
pub use estimator::{HttpPoseEstimator, PoseEstimator};
pub use runner::{AnalysisMode, NoProgress, ProgressSink, VideoAnalyzer};
pub use source::{FfmpegOpener, FrameSource, Sampling, VideoMeta, VideoOpener};
