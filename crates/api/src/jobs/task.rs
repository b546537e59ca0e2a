use std::sync::Arc;

use tokio::task::JoinHandle;

use formcheck_core::exercise::ExerciseType;
use formcheck_core::types::JobId;
use formcheck_pipeline::{AnalysisMode, FrameSource, VideoAnalyzer};

use super::store::{JobProgress, JobStore};
use crate::upload::UploadedVideo;

/// Message recorded when the analysis task dies without reporting.
pub const ABORTED_MESSAGE: &str = "Analysis failed unexpectedly";

/// Run one background analysis to completion.
///
/// The task owns every write to its job record after submission. The
/// analysis itself runs in a child task so that a panic still leaves the
/// job in `error`. The uploaded file is removed when the task ends,
/// whatever the outcome.
pub fn spawn_analysis(
    jobs: Arc<JobStore>,
    analyzer: VideoAnalyzer,
    id: JobId,
    source: Box<dyn FrameSource>,
    upload: UploadedVideo,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let exercise = upload.exercise;
        let worker = {
            let jobs = Arc::clone(&jobs);
            let id = id.clone();
            tokio::spawn(async move { run(&jobs, &analyzer, &id, source, exercise).await })
        };
        if let Err(e) = worker.await {
            tracing::error!(job_id = %id, error = %e, "Background analysis aborted");
            if let Err(e) = jobs.update(&id, |job| job.fail(ABORTED_MESSAGE)).await {
                tracing::debug!(job_id = %id, error = %e, "Aborted job already settled");
            }
        }
        upload.cleanup();
    })
}

async fn run(
    jobs: &JobStore,
    analyzer: &VideoAnalyzer,
    id: &str,
    source: Box<dyn FrameSource>,
    exercise: ExerciseType,
) {
    if let Err(e) = jobs.update(id, |job| job.start()).await {
        tracing::warn!(job_id = %id, error = %e, "Analysis job vanished before start");
        return;
    }
    tracing::info!(job_id = %id, %exercise, "Background analysis started");

    let progress = JobProgress { store: jobs, id };
    let outcome = analyzer
        .analyze_source(source, exercise, AnalysisMode::Background, &progress)
        .await;

    let recorded = match outcome {
        Ok(result) => {
            tracing::info!(job_id = %id, repetitions = result.repetitions, "Background analysis completed");
            jobs.update(id, |job| job.complete(result)).await
        }
        Err(e) => {
            tracing::error!(job_id = %id, error = %e, "Background analysis failed");
            jobs.update(id, |job| job.fail(format!("Error analyzing video: {e}")))
                .await
        }
    };
    if let Err(e) = recorded {
        tracing::debug!(job_id = %id, error = %e, "Analysis finished after its record was removed");
    }
}
