pub mod health;
pub mod layout;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /layout                                          compute layout (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(layout::router())
}
