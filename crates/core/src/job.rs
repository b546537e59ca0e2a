//! Background analysis job lifecycle.
//!
//! A job moves `Queued -> Processing -> Completed | Error` and never
//! backwards. Progress only grows, and terminal jobs reject every further
//! transition with [`CoreError::Conflict`].

use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::error::CoreError;
use crate::exercise::ExerciseType;
use crate::types::{JobId, Timestamp};

// ---------------------------------------------------------------------------
// Progress milestones
// ---------------------------------------------------------------------------

/// Highest progress reported while frames are still streaming.
pub const STREAMING_PROGRESS_CAP: u8 = 90;

/// Progress once streaming is done and the analysis itself runs.
pub const FINALIZING_PROGRESS: u8 = 95;

pub const COMPLETE_PROGRESS: u8 = 100;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, background task not yet running.
    Queued,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisJob {
    #[serde(rename = "analysis_id")]
    pub id: JobId,
    pub exercise: ExerciseType,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    #[serde(rename = "results", skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AnalysisJob {
    pub fn new(id: JobId, exercise: ExerciseType) -> Self {
        let now = chrono::Utc::now();
        Self {
            id,
            exercise,
            status: JobStatus::Queued,
            progress: 0,
            message: "Queued for analysis.".to_string(),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition_error(&self, action: &str) -> CoreError {
        CoreError::Conflict(format!(
            "Cannot {action} analysis {} in status '{}'",
            self.id, self.status
        ))
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }

    /// `Queued -> Processing`.
    pub fn start(&mut self) -> Result<(), CoreError> {
        if self.status != JobStatus::Queued {
            return Err(self.transition_error("start"));
        }
        self.status = JobStatus::Processing;
        self.message = "Starting video analysis...".to_string();
        self.touch();
        Ok(())
    }

    /// Record progress while processing. Values below the current progress
    /// are ignored; values above 100 are clamped.
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) -> Result<(), CoreError> {
        if self.status != JobStatus::Processing {
            return Err(self.transition_error("update"));
        }
        self.progress = self.progress.max(progress.min(COMPLETE_PROGRESS));
        self.message = message.into();
        self.touch();
        Ok(())
    }

    /// `Processing -> Completed`.
    pub fn complete(&mut self, result: AnalysisResult) -> Result<(), CoreError> {
        if self.status != JobStatus::Processing {
            return Err(self.transition_error("complete"));
        }
        self.status = JobStatus::Completed;
        self.progress = COMPLETE_PROGRESS;
        self.message = "Video analysis completed successfully.".to_string();
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    /// `Queued | Processing -> Error`.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        if self.status.is_terminal() {
            return Err(self.transition_error("fail"));
        }
        self.status = JobStatus::Error;
        self.progress = COMPLETE_PROGRESS;
        self.message = message.into();
        self.touch();
        Ok(())
    }

    /// What a poller sees: the full record once completed, otherwise only
    /// status, progress and message.
    pub fn snapshot(&self) -> JobSnapshot {
        if self.status == JobStatus::Completed {
            JobSnapshot::Complete(Box::new(self.clone()))
        } else {
            JobSnapshot::Pending {
                status: self.status,
                progress: self.progress,
                message: self.message.clone(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobSnapshot {
    Complete(Box<AnalysisJob>),
    Pending {
        status: JobStatus,
        progress: u8,
        message: String,
    },
}

impl JobSnapshot {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Complete(job) => job.status,
            Self::Pending { status, .. } => *status,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkSequence;
    use crate::thresholds::AnalysisThresholds;
    use assert_matches::assert_matches;

    fn job() -> AnalysisJob {
        AnalysisJob::new("job-1".into(), ExerciseType::Quadruped)
    }

    fn result() -> AnalysisResult {
        AnalysisResult::insufficient_data(
            &LandmarkSequence::new(30.0),
            ExerciseType::Quadruped,
            &AnalysisThresholds::default(),
        )
    }

    #[test]
    fn happy_path() {
        let mut j = job();
        assert_eq!(j.status, JobStatus::Queued);
        j.start().unwrap();
        j.advance(40, "Analyzing frame 40/100...").unwrap();
        j.advance(STREAMING_PROGRESS_CAP, "Analyzing frame 100/100...").unwrap();
        j.complete(result()).unwrap();
        assert_eq!(j.status, JobStatus::Completed);
        assert_eq!(j.progress, 100);
        assert!(j.result.is_some());
    }

    #[test]
    fn progress_never_decreases() {
        let mut j = job();
        j.start().unwrap();
        j.advance(50, "half").unwrap();
        j.advance(10, "late update").unwrap();
        assert_eq!(j.progress, 50);
        j.advance(250, "overshoot").unwrap();
        assert_eq!(j.progress, 100);
    }

    #[test]
    fn terminal_states_are_frozen() {
        let mut j = job();
        j.start().unwrap();
        j.fail("Error analyzing video: decoder exploded").unwrap();
        assert_matches!(j.start(), Err(CoreError::Conflict(_)));
        assert_matches!(j.advance(10, "x"), Err(CoreError::Conflict(_)));
        assert_matches!(j.complete(result()), Err(CoreError::Conflict(_)));
        assert_matches!(j.fail("again"), Err(CoreError::Conflict(_)));
        assert_eq!(j.status, JobStatus::Error);
        assert!(j.message.contains("decoder exploded"));
    }

    #[test]
    fn queued_job_cannot_complete() {
        let mut j = job();
        assert_matches!(j.complete(result()), Err(CoreError::Conflict(_)));
        assert_matches!(j.advance(5, "x"), Err(CoreError::Conflict(_)));
        // but it can fail before the task ever starts
        assert!(j.fail("Unable to open video file").is_ok());
    }

    #[test]
    fn snapshot_shape_depends_on_status() {
        let mut j = job();
        j.start().unwrap();
        let pending = serde_json::to_value(j.snapshot()).unwrap();
        assert_eq!(pending["status"], "processing");
        assert!(pending.get("results").is_none());
        assert!(pending.get("analysis_id").is_none());

        j.complete(result()).unwrap();
        let done = serde_json::to_value(j.snapshot()).unwrap();
        assert_eq!(done["status"], "completed");
        assert_eq!(done["analysis_id"], "job-1");
        assert!(done["results"]["summary"].is_string());
    }
}
