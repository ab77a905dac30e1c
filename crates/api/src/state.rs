use std::sync::Arc;

use lgl_pool::WorkerPool;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// Layout worker pool.
    pub pool: Arc<WorkerPool>,
    /// Server settings, reported by `/health`.
    pub config: Arc<ServerConfig>,
}
