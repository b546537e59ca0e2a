//! Starting-position check for a single uploaded image.

use image::DynamicImage;

use formcheck_core::error::CoreError;
use formcheck_core::exercise::ExerciseType;
use formcheck_core::lighting::Lighting;
use formcheck_core::position::{check_position, PositionCheckResult};
use formcheck_core::thresholds::PositionThresholds;

use crate::error::PipelineError;
use crate::estimator::PoseEstimator;

/// Decode an image off the async runtime.
pub async fn decode_image(bytes: Vec<u8>) -> Result<DynamicImage, PipelineError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| CoreError::Internal(format!("Image decode task failed: {e}")))?
        .map_err(|e| PipelineError::Input(format!("Unable to read image file: {e}")))
}

/// Decode, assess lighting, estimate the pose and check the position.
pub async fn check_image(
    bytes: Vec<u8>,
    exercise: ExerciseType,
    estimator: &dyn PoseEstimator,
    thresholds: &PositionThresholds,
) -> Result<PositionCheckResult, PipelineError> {
    let image = decode_image(bytes).await?;
    let lighting = Lighting::measure(&image);
    let quality = lighting.quality(thresholds);
    tracing::debug!(
        brightness = lighting.brightness,
        contrast = lighting.contrast,
        ?quality,
        "Assessed lighting"
    );

    let landmarks = estimator.estimate(&image.to_rgb8()).await?;
    Ok(check_position(
        landmarks.as_deref(),
        quality,
        exercise,
        thresholds,
    ))
}
