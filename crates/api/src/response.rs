//! Response payloads shared by API handlers.
//!
//! Analysis results and job snapshots serialize straight from
//! `formcheck_core`; only the small acknowledgement bodies live here.

use formcheck_core::job::JobStatus;
use formcheck_core::types::JobId;
use serde::Serialize;

/// Body of `202 Accepted` for a background analysis.
#[derive(Debug, Serialize)]
pub struct AnalysisAccepted {
    pub analysis_id: JobId,
    pub status: JobStatus,
    /// Rough wall-clock estimate for the client's progress UI.
    pub estimated_seconds: u64,
}

/// `{ "status": "success", "message": ... }` acknowledgement.
#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }
}
