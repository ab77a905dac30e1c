//! Per-worker dispatch loop.
//!
//! Each worker gets exactly one loop. The loop takes the next job from the
//! shared [`JobQueue`], runs it against its own worker, resolves the job,
//! and only then asks for another, so a worker never has two jobs in flight.
//! A failed job does not stop the loop. A job whose submitter stopped
//! waiting before it was claimed is discarded without reaching the worker.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::api::{RpcError, WorkerApi};
use crate::queue::{Job, JobQueue, JobResult};
use crate::supervisor::WorkerHandle;

/// Per-worker job counters.
#[derive(Debug, Default)]
pub struct WorkerStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl WorkerStats {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn record(&self, result: &JobResult) {
        let counter = if result.is_ok() {
            &self.completed
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Consumer that serially executes queued jobs against one worker.
pub struct DispatchLoop {
    worker: WorkerHandle,
    api: WorkerApi,
    queue: Arc<JobQueue>,
    stats: Arc<WorkerStats>,
}

impl DispatchLoop {
    pub fn new(
        worker: WorkerHandle,
        api: WorkerApi,
        queue: Arc<JobQueue>,
        stats: Arc<WorkerStats>,
    ) -> Self {
        Self {
            worker,
            api,
            queue,
            stats,
        }
    }

    /// Run until the token is cancelled or the queue is closed and drained.
    pub async fn run(self, cancel: CancellationToken) {
        let slot = self.worker.slot();
        tracing::info!(slot, port = self.worker.port(), "Dispatch loop started");

        loop {
            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                job = self.queue.dequeue() => match job {
                    Some(job) => job,
                    None => break,
                },
            };
            self.process(job).await;
        }

        tracing::info!(slot, "Dispatch loop stopped");
    }

    async fn process(&self, job: Job) {
        let slot = self.worker.slot();
        let job_id = job.id;
        if job.is_abandoned() {
            tracing::debug!(slot, %job_id, "Skipping job, submitter stopped waiting");
            return;
        }
        tracing::debug!(slot, %job_id, "Job claimed");

        let result = self.execute(&job).await;
        self.stats.record(&result);

        match &result {
            Ok(_) => tracing::info!(slot, %job_id, "Layout job completed"),
            Err(e) => tracing::warn!(slot, %job_id, error = %e, "Layout job failed"),
        }

        if !job.resolve(result) {
            tracing::debug!(slot, %job_id, "Submitter stopped waiting for job");
        }
    }

    async fn execute(&self, job: &Job) -> JobResult {
        if !self.worker.is_alive() {
            return Err(RpcError::WorkerExited {
                port: self.worker.port(),
            });
        }
        self.api.calculate(&job.request).await
    }
}
