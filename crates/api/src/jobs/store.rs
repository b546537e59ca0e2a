use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use formcheck_core::error::CoreError;
use formcheck_core::job::{AnalysisJob, JobSnapshot};
use formcheck_core::types::JobId;
use formcheck_pipeline::ProgressSink;

const ENTITY: &str = "Analysis";

/// Process-scoped registry of analysis jobs.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. Records live until deleted.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, AnalysisJob>>,
}

impl JobStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a job, replacing any record with the same id.
    pub async fn insert(&self, job: AnalysisJob) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    /// Poll view of a job.
    pub async fn get(&self, id: &str) -> Result<JobSnapshot, CoreError> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(AnalysisJob::snapshot)
            .ok_or_else(|| not_found(id))
    }

    /// Apply `f` to a job while holding the write lock.
    pub async fn update<T, F>(&self, id: &str, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut AnalysisJob) -> Result<T, CoreError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(id).ok_or_else(|| not_found(id))?;
        f(job)
    }

    /// Remove a job. A running task keeps going but its writes are dropped.
    pub async fn remove(&self, id: &str) -> Result<AnalysisJob, CoreError> {
        self.jobs
            .write()
            .await
            .remove(id)
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: ENTITY,
        id: id.to_string(),
    }
}

/// Forwards pipeline progress into a job record.
pub struct JobProgress<'a> {
    pub store: &'a JobStore,
    pub id: &'a str,
}

#[async_trait]
impl ProgressSink for JobProgress<'_> {
    async fn report(&self, progress: u8, message: String) {
        if let Err(e) = self
            .store
            .update(self.id, |job| job.advance(progress, message))
            .await
        {
            tracing::debug!(job_id = %self.id, error = %e, "Dropped progress update");
        }
    }
}
