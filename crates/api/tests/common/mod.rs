#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use lgl_pool::stub::{self, StubBehaviour};
use lgl_pool::supervisor::WorkerHandle;
use lgl_pool::{PoolConfig, WorkerPool};
use tempfile::TempDir;
use tower::ServiceExt;

use lgl_api::config::ServerConfig;
use lgl_api::router::build_app_router;
use lgl_api::state::AppState;

/// A router wired to a pool of in-process fake workers.
pub struct TestApp {
    pub router: Router,
    pub pool: Arc<WorkerPool>,
    _scratch: TempDir,
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        skip_self_test: true,
    }
}

/// Build the full application router around fake workers on `ports`.
pub async fn build_test_app(ports: &[u16]) -> TestApp {
    let scratch = tempfile::tempdir().unwrap();
    let pool_config = PoolConfig {
        worker_count: ports.len(),
        scratch_dir: scratch.path().to_path_buf(),
        ..PoolConfig::default()
    };
    let handles = ports
        .iter()
        .enumerate()
        .map(|(slot, &port)| WorkerHandle::external(slot, port))
        .collect();
    let pool = WorkerPool::attach(handles, &pool_config).await.unwrap();

    let config = test_config();
    let state = AppState {
        pool: Arc::clone(&pool),
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        pool,
        _scratch: scratch,
    }
}

// ---------------------------------------------------------------------------
// Fake workers
// ---------------------------------------------------------------------------

async fn serve(router: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

/// A stand-in worker that places vertices on a circle of radius
/// `optimalDistance`.
pub async fn circle_worker() -> u16 {
    serve(stub::router(StubBehaviour::default())).await
}

/// A worker that answers every request with `status` and `body`.
pub async fn failing_worker(status: StatusCode, body: &'static str) -> u16 {
    serve(stub::router(StubBehaviour::failing(status, body))).await
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
