use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use lgl_pool::WorkerStatus;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when every worker is alive, otherwise `degraded`.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub workers: Vec<WorkerStatus>,
    /// Jobs waiting for a free worker.
    pub queued_jobs: usize,
    /// Seconds a layout request may take before it is answered with 408.
    pub request_timeout_secs: u64,
}

/// GET /health -- returns service and worker pool health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let pool = state.pool.status();

    Json(HealthResponse {
        status: overall_status(&pool.workers),
        version: env!("CARGO_PKG_VERSION"),
        workers: pool.workers,
        queued_jobs: pool.queued_jobs,
        request_timeout_secs: state.config.request_timeout_secs,
    })
}

/// Mount health check routes (root level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// `ok` only while every worker process is still running.
fn overall_status(workers: &[WorkerStatus]) -> &'static str {
    if workers.iter().all(|w| w.alive) {
        "ok"
    } else {
        "degraded"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker(slot: usize, alive: bool) -> WorkerStatus {
        WorkerStatus {
            slot,
            port: 40000 + slot as u16,
            alive,
            jobs_completed: 0,
            jobs_failed: 0,
        }
    }

    #[test]
    fn one_dead_worker_degrades_the_service() {
        assert_eq!(overall_status(&[worker(0, true), worker(1, true)]), "ok");
        assert_eq!(overall_status(&[worker(0, true), worker(1, false)]), "degraded");
    }
}
