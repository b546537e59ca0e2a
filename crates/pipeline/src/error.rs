use formcheck_core::error::CoreError;

use crate::estimator::EstimatorError;
use crate::ffmpeg::FfmpegError;

/// Errors raised while turning an upload into an analysis.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The upload cannot be decoded: unreadable image, unopenable or empty video.
    #[error("Invalid input: {0}")]
    Input(String),

    #[error(transparent)]
    Ffmpeg(#[from] FfmpegError),

    #[error("Pose estimation failed: {0}")]
    Estimator(#[from] EstimatorError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
