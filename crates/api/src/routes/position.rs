use axum::routing::post;
use axum::Router;

use crate::handlers::position;
use crate::state::AppState;

/// Routes mounted under `/api`.
///
/// ```text
/// POST /check-position   -> check_position
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/check-position", post(position::check_position))
}
