use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use formcheck_core::error::CoreError;
use formcheck_pipeline::ffmpeg::FfmpegError;
use formcheck_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`PipelineError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `formcheck_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A decoding or pose-estimation error from `formcheck_pipeline`.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The upload exceeds the configured size limit (bytes).
    #[error("Upload exceeds {0} bytes")]
    PayloadTooLarge(u64),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),

            AppError::Pipeline(err) => classify_pipeline_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge(limit) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("Upload exceeds the {} MiB limit", limit / (1024 * 1024)),
            ),
            AppError::InternalError(msg) => internal(msg),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::InsufficientData { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "INSUFFICIENT_DATA",
            err.to_string(),
        ),
        CoreError::Internal(msg) => internal(msg),
    }
}

/// Classify a pipeline error into an HTTP status, error code, and message.
///
/// - Unreadable uploads map to 400.
/// - A missing `ffmpeg` binary or a failing pose estimator maps to 5xx.
fn classify_pipeline_error(err: &PipelineError) -> (StatusCode, &'static str, String) {
    match err {
        PipelineError::Input(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
        PipelineError::Ffmpeg(FfmpegError::ExecutionFailed { .. })
        | PipelineError::Ffmpeg(FfmpegError::ParseError(_))
        | PipelineError::Ffmpeg(FfmpegError::VideoNotFound(_)) => {
            tracing::warn!(error = %err, "Rejected unreadable video");
            (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                "Unable to open video file".to_string(),
            )
        }
        PipelineError::Estimator(e) => {
            tracing::error!(error = %e, "Pose estimator unavailable");
            (
                StatusCode::BAD_GATEWAY,
                "POSE_ESTIMATOR_UNAVAILABLE",
                "Pose estimation service is unavailable".to_string(),
            )
        }
        PipelineError::Core(core) => classify_core_error(core),
        PipelineError::Ffmpeg(_) | PipelineError::Io(_) => internal(&err.to_string()),
    }
}

fn internal(msg: &str) -> (StatusCode, &'static str, String) {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
