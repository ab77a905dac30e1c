use axum::routing::post;
use axum::Router;

use crate::handlers::layout;
use crate::state::AppState;

/// Layout routes, mounted under `/api/v1`.
///
/// ```text
/// POST /layout  -> compute_layout
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/layout", post(layout::compute_layout))
}
