use std::sync::Arc;

use formcheck_core::thresholds::PositionThresholds;
use formcheck_pipeline::{PoseEstimator, VideoAnalyzer};

use crate::config::ServerConfig;
use crate::jobs::JobStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (upload limit, sampling).
    pub config: Arc<ServerConfig>,
    /// Background analysis jobs, keyed by analysis id.
    pub jobs: Arc<JobStore>,
    /// Video decode + pose estimation + analysis.
    pub analyzer: VideoAnalyzer,
    /// Estimator used directly by the position check.
    pub estimator: Arc<dyn PoseEstimator>,
    pub position_thresholds: Arc<PositionThresholds>,
}
