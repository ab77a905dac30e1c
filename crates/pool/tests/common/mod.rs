#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::Router;
use lgl_core::{Edge, Graph, Node};
use lgl_pool::{PoolConfig, WorkerCommand};

/// Path of the stub worker binary built alongside these tests.
pub const STUB_WORKER: &str = env!("CARGO_BIN_EXE_lgl-stub-worker");

/// Pool configuration that launches `count` stub workers and keeps scratch
/// files under `scratch_root`.
pub fn stub_config(scratch_root: &Path, count: usize) -> PoolConfig {
    PoolConfig {
        worker_count: count,
        worker: WorkerCommand::new(STUB_WORKER),
        kill_command: None,
        scratch_dir: scratch_root.join("scratch"),
        startup_timeout: Duration::from_secs(10),
        rpc_timeout: Duration::from_secs(10),
    }
}

/// Same as [`stub_config`] with extra environment for every stub.
pub fn stub_config_with_env(
    scratch_root: &Path,
    count: usize,
    env: &[(&str, &str)],
) -> PoolConfig {
    let mut config = stub_config(scratch_root, count);
    for (key, value) in env {
        config.worker = config.worker.env(*key, *value);
    }
    config
}

/// Serve `router` on an ephemeral loopback port and return the port.
pub async fn spawn_fake_worker(router: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

/// `n` nodes, every other node linked to node 0.
pub fn star_graph(n: usize) -> Graph {
    let nodes = (0..n).map(|i| Node::with_id(format!("n{i}"))).collect();
    let links = (1..n).map(|i| Edge::new(0, i)).collect();
    Graph::new(nodes, links)
}

/// `true` if the directory holds no files.
pub fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
