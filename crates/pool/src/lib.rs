//! Worker-pool orchestration for external LGL layout processes.
//!
//! [`WorkerPool`] launches a fixed number of layout workers, gives each a
//! dispatch loop, and exposes [`WorkerPool::compute_layout`], which writes
//! a job's input file, queues the job, waits for a worker to run it, and
//! merges the worker's output back into the caller's graph.

pub mod api;
pub mod calculator;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod pool;
pub mod queue;
pub mod scratch;
pub mod selftest;
pub mod stub;
pub mod supervisor;

pub use config::{PoolConfig, WorkerCommand};
pub use error::LayoutError;
pub use pool::{PoolStatus, WorkerPool, WorkerStatus};
