//! Handlers for video analysis: synchronous, background and job polling.

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use formcheck_core::analysis::AnalysisResult;
use formcheck_core::job::{AnalysisJob, JobSnapshot};
use formcheck_core::types::new_job_id;
use formcheck_pipeline::estimate::estimated_processing_seconds;
use formcheck_pipeline::{AnalysisMode, NoProgress};

use crate::error::AppResult;
use crate::jobs::spawn_analysis;
use crate::response::{AnalysisAccepted, StatusMessage};
use crate::state::AppState;
use crate::upload::{ensure_content_length, receive_video};

/// POST /api/analyze
///
/// Analyze an uploaded video inside the request. Too few valid frames yields
/// a regular result carrying the insufficient-data message.
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<Json<AnalysisResult>> {
    let limit = state.config.max_upload_bytes;
    ensure_content_length(&headers, limit)?;
    let upload = receive_video(multipart, limit).await?;

    let outcome = match state.analyzer.open(upload.path()).await {
        Ok(source) => {
            state
                .analyzer
                .analyze_source(source, upload.exercise, AnalysisMode::Blocking, &NoProgress)
                .await
        }
        Err(e) => Err(e),
    };
    upload.cleanup();

    Ok(Json(outcome?))
}

/// POST /api/analyze/async
///
/// Validate the upload, register a job and analyze it in the background.
pub async fn analyze_async(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<AnalysisAccepted>)> {
    let limit = state.config.max_upload_bytes;
    ensure_content_length(&headers, limit)?;
    let upload = receive_video(multipart, limit).await?;

    let source = match state.analyzer.open(upload.path()).await {
        Ok(source) => source,
        Err(e) => {
            upload.cleanup();
            return Err(e.into());
        }
    };
    let estimated_seconds = estimated_processing_seconds(source.meta().duration_secs);

    let job = AnalysisJob::new(new_job_id(), upload.exercise);
    let analysis_id = job.id.clone();
    let status = job.status;
    state.jobs.insert(job).await;
    tracing::info!(
        job_id = %analysis_id,
        exercise = %upload.exercise,
        estimated_seconds,
        "Queued background analysis"
    );

    spawn_analysis(
        state.jobs.clone(),
        state.analyzer.clone(),
        analysis_id.clone(),
        source,
        upload,
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(AnalysisAccepted {
            analysis_id,
            status,
            estimated_seconds,
        }),
    ))
}

/// GET /api/analysis-status/{id}
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<JobSnapshot>> {
    Ok(Json(state.jobs.get(&id).await?))
}

/// DELETE /api/analysis/{id}
///
/// Drops the record only; an in-flight analysis runs to the end and its
/// result is discarded.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<StatusMessage>> {
    let job = state.jobs.remove(&id).await?;
    tracing::info!(job_id = %id, status = %job.status, "Deleted analysis");
    Ok(Json(StatusMessage::success(format!("Analysis {id} deleted"))))
}
