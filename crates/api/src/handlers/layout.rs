//! Handlers for graph layout requests.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use lgl_core::{Graph, LayoutSettings};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body of `POST /layout`.
#[derive(Debug, Deserialize)]
pub struct LayoutRequest {
    /// The graph to lay out. Kept raw so a missing or `null` graph is
    /// reported as invalid input rather than a decode failure.
    #[serde(default)]
    pub graph: serde_json::Value,
    #[serde(default)]
    pub settings: Option<LayoutSettings>,
}

// ---------------------------------------------------------------------------
// POST /layout
// ---------------------------------------------------------------------------

/// Lay out a graph on the worker pool and return it with node coordinates.
///
/// Blocks until a worker has finished the job.
pub async fn compute_layout(
    State(state): State<AppState>,
    payload: Result<Json<LayoutRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let graph = Graph::from_value(input.graph)?;
    let settings = input.settings.unwrap_or_default();

    tracing::info!(
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        iterations = settings.iterations,
        "Layout requested",
    );

    let graph = state.pool.compute_layout(graph, settings).await?;
    Ok(Json(DataResponse { data: graph }))
}
