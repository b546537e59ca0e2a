pub mod analysis;
pub mod health;
pub mod position;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /analyze                     synchronous analysis (POST)
/// /analyze/async               background analysis (POST)
/// /analysis-status/{id}        poll a background analysis (GET)
/// /analysis/{id}               delete a background analysis (DELETE)
///
/// /check-position              starting-position check (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(analysis::router())
        .merge(position::router())
}
