use axum::extract::{Multipart, State};
use axum::http::HeaderMap;
use axum::Json;

use formcheck_core::position::PositionCheckResult;
use formcheck_pipeline::position::check_image;

use crate::error::AppResult;
use crate::state::AppState;
use crate::upload::{ensure_content_length, receive_image};

/// POST /api/check-position
///
/// Check a single still frame for the exercise's starting position.
pub async fn check_position(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<PositionCheckResult>> {
    let limit = state.config.max_upload_bytes;
    ensure_content_length(&headers, limit)?;
    let upload = receive_image(multipart, limit).await?;

    let result = check_image(
        upload.bytes,
        upload.exercise,
        state.estimator.as_ref(),
        &state.position_thresholds,
    )
    .await?;
    tracing::debug!(
        exercise = %upload.exercise,
        correct = result.is_position_correct,
        "Checked starting position"
    );
    Ok(Json(result))
}
