//! Stand-in layout worker.
//!
//! Serves `POST /calculate` by placing every vertex of the Pajek input on
//! a circle of radius `optimalDistance`. Backs the `lgl-stub-worker` binary
//! and in-process test workers.

use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use lgl_core::{pajek, JobRequest, Position};
use serde_json::json;

/// How the stand-in answers requests.
///
/// | Env Var                  | Field         |
/// |--------------------------|---------------|
/// | `LGL_STUB_FAIL_STATUS`   | `fail_status` |
/// | `LGL_STUB_FAIL_BODY`     | `fail_body`   |
/// | `LGL_STUB_DELAY_MS`      | `delay`       |
/// | `LGL_STUB_EXIT_AFTER_MS` | `exit_after`  |
#[derive(Debug, Clone, Default)]
pub struct StubBehaviour {
    /// Answer every request with this status and `fail_body`.
    pub fail_status: Option<StatusCode>,
    pub fail_body: String,
    /// Sleep this long before answering.
    pub delay: Option<Duration>,
    /// Exit the process this long after announcing readiness.
    pub exit_after: Option<Duration>,
}

impl StubBehaviour {
    pub fn from_env() -> Self {
        Self {
            fail_status: env_parse::<u16>("LGL_STUB_FAIL_STATUS")
                .and_then(|code| StatusCode::from_u16(code).ok()),
            fail_body: std::env::var("LGL_STUB_FAIL_BODY")
                .unwrap_or_else(|_| "layout failed".to_string()),
            delay: env_parse::<u64>("LGL_STUB_DELAY_MS").map(Duration::from_millis),
            exit_after: env_parse::<u64>("LGL_STUB_EXIT_AFTER_MS").map(Duration::from_millis),
        }
    }

    /// A stand-in that fails every request.
    pub fn failing(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            fail_status: Some(status),
            fail_body: body.into(),
            ..Self::default()
        }
    }
}

pub fn router(behaviour: StubBehaviour) -> Router {
    Router::new()
        .route("/calculate", post(calculate))
        .with_state(Arc::new(behaviour))
}

/// `count` positions evenly spaced on a circle, in ref order.
pub fn circle(count: usize, radius: f64) -> Vec<Position> {
    (0..count)
        .map(|i| {
            let angle = TAU * i as f64 / count as f64;
            Position::new(i, radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

async fn calculate(
    State(behaviour): State<Arc<StubBehaviour>>,
    Json(request): Json<JobRequest>,
) -> Response {
    if let Some(delay) = behaviour.delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = behaviour.fail_status {
        return (status, behaviour.fail_body.clone()).into_response();
    }

    match lay_out(&request).await {
        Ok((nodes, edges)) => {
            tracing::info!(nodes, edges, target = %request.target.display(), "Layout written");
            Json(json!({ "nodes": nodes, "edges": edges })).into_response()
        }
        Err(message) => {
            tracing::warn!(error = %message, "Layout failed");
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

async fn lay_out(request: &JobRequest) -> Result<(usize, usize), String> {
    let text = tokio::fs::read_to_string(&request.source)
        .await
        .map_err(|e| format!("Cannot read {}: {e}", request.source.display()))?;
    let network = pajek::parse(&text).map_err(|e| e.to_string())?;

    let positions = circle(network.vertices, request.settings.optimal_distance);
    let body = serde_json::to_vec(&positions).map_err(|e| e.to_string())?;
    tokio::fs::write(&request.target, body)
        .await
        .map_err(|e| format!("Cannot write {}: {e}", request.target.display()))?;

    Ok((network.vertices, network.edges.len()))
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok()?.trim().parse().ok()
}
