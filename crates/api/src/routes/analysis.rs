use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// Routes mounted under `/api`.
///
/// ```text
/// POST   /analyze                   -> analyze
/// POST   /analyze/async             -> analyze_async
/// GET    /analysis-status/{id}      -> status
/// DELETE /analysis/{id}             -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analysis::analyze))
        .route("/analyze/async", post(analysis::analyze_async))
        .route("/analysis-status/{id}", get(analysis::status))
        .route("/analysis/{id}", delete(analysis::delete))
}
