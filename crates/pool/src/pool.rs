//! The worker pool: supervised workers, their dispatch loops, the shared
//! job queue, and the scratch directory.
//!
//! Created once at startup via [`WorkerPool::start`] and shared behind an
//! `Arc`. [`WorkerPool::shutdown`] stops the loops and kills the workers.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lgl_core::JobRequest;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::{self, RpcError, WorkerApi};
use crate::config::PoolConfig;
use crate::dispatch::{DispatchLoop, WorkerStats};
use crate::error::LayoutError;
use crate::queue::{Job, JobQueue, JobResult};
use crate::scratch::{ScratchDir, ScratchFiles};
use crate::supervisor::{Supervisor, WorkerHandle};

/// How long shutdown waits for each loop to finish its current job.
const LOOP_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A fixed set of layout workers fed from one job queue.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    workers: Vec<ManagedWorker>,
    pub(crate) scratch: ScratchDir,
    supervisor: Option<Supervisor>,
    cancel: CancellationToken,
    loops: Mutex<Vec<JoinHandle<()>>>,
}

struct ManagedWorker {
    handle: WorkerHandle,
    stats: Arc<WorkerStats>,
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub workers: Vec<WorkerStatus>,
    pub queued_jobs: usize,
}

/// Point-in-time view of one worker.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub slot: usize,
    pub port: u16,
    pub alive: bool,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
}

impl WorkerPool {
    /// Launch the configured workers and start one dispatch loop each.
    ///
    /// Fails with [`LayoutError::StartupFailure`] if any worker does not
    /// become ready; no partial pool is ever returned.
    pub async fn start(config: &PoolConfig) -> Result<Arc<Self>, LayoutError> {
        let scratch = ScratchDir::create(&config.scratch_dir).await?;
        let (supervisor, workers) = Supervisor::start(config).await?;
        tracing::info!(
            count = workers.len(),
            scratch = %scratch.path().display(),
            "Layout workers ready",
        );

        match Self::assemble(workers, scratch, config, Some(supervisor)) {
            Ok(pool) => Ok(pool),
            Err((e, supervisor)) => {
                if let Some(supervisor) = supervisor {
                    supervisor.shutdown().await;
                }
                Err(e)
            }
        }
    }

    /// Build a pool around workers that are already running elsewhere.
    ///
    /// The pool does not own these processes and will not stop them.
    pub async fn attach(
        workers: Vec<WorkerHandle>,
        config: &PoolConfig,
    ) -> Result<Arc<Self>, LayoutError> {
        let scratch = ScratchDir::create(&config.scratch_dir).await?;
        Self::assemble(workers, scratch, config, None).map_err(|(e, _)| e)
    }

    fn assemble(
        workers: Vec<WorkerHandle>,
        scratch: ScratchDir,
        config: &PoolConfig,
        supervisor: Option<Supervisor>,
    ) -> Result<Arc<Self>, (LayoutError, Option<Supervisor>)> {
        let client = match api::build_client(config.rpc_timeout) {
            Ok(client) => client,
            Err(e) => return Err((e.into(), supervisor)),
        };

        let queue = Arc::new(JobQueue::new());
        let cancel = CancellationToken::new();
        let mut managed = Vec::with_capacity(workers.len());
        let mut loops = Vec::with_capacity(workers.len());

        for handle in workers {
            let stats = Arc::new(WorkerStats::default());
            let api = WorkerApi::with_client(client.clone(), handle.port());
            let dispatch =
                DispatchLoop::new(handle.clone(), api, Arc::clone(&queue), Arc::clone(&stats));
            loops.push(tokio::spawn(dispatch.run(cancel.child_token())));
            managed.push(ManagedWorker { handle, stats });
        }

        Ok(Arc::new(Self {
            queue,
            workers: managed,
            scratch,
            supervisor,
            cancel,
            loops: Mutex::new(loops),
        }))
    }

    /// Queue a request and wait for whichever worker picks it up.
    pub async fn submit(&self, request: JobRequest) -> Result<serde_json::Value, RpcError> {
        let (job, reply) = Job::new(request);
        self.enqueue(job);
        match reply.await {
            Ok(completion) => completion.result,
            Err(_) => Err(RpcError::Dropped),
        }
    }

    /// Like [`submit`](Self::submit), but the job owns `files` until it
    /// resolves. They come back with the result; if the job was dropped
    /// instead, they were removed with it.
    pub(crate) async fn submit_with_files(
        &self,
        request: JobRequest,
        files: ScratchFiles,
    ) -> (JobResult, Option<ScratchFiles>) {
        let (job, reply) = Job::new(request);
        self.enqueue(job.with_files(files));
        match reply.await {
            Ok(completion) => (completion.result, completion.files),
            Err(_) => (Err(RpcError::Dropped), None),
        }
    }

    fn enqueue(&self, job: Job) {
        tracing::debug!(job_id = %job.id, queued = self.queue.len(), "Job queued");
        self.queue.enqueue(job);
    }

    /// Directory holding in-flight jobs' scratch files.
    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    pub fn workers(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.workers.iter().map(|w| &w.handle)
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            workers: self
                .workers
                .iter()
                .map(|w| WorkerStatus {
                    slot: w.handle.slot(),
                    port: w.handle.port(),
                    alive: w.handle.is_alive(),
                    jobs_completed: w.stats.completed(),
                    jobs_failed: w.stats.failed(),
                })
                .collect(),
            queued_jobs: self.queue.len(),
        }
    }

    /// Stop the dispatch loops, drop queued jobs, and kill owned workers.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down layout worker pool");
        self.queue.close();
        self.cancel.cancel();

        let mut loops = self.loops.lock().await;
        for handle in loops.drain(..) {
            let abort = handle.abort_handle();
            if tokio::time::timeout(LOOP_SHUTDOWN_TIMEOUT, handle).await.is_err() {
                abort.abort();
            }
        }

        // The queue is closed, so this never waits. Dropped jobs resolve
        // their submitters with `RpcError::Dropped`.
        let mut dropped = 0usize;
        while let Some(job) = self.queue.dequeue().await {
            tracing::debug!(job_id = %job.id, "Dropping queued job");
            dropped += 1;
        }
        if dropped > 0 {
            tracing::warn!(dropped, "Queued layout jobs abandoned at shutdown");
        }

        if let Some(supervisor) = &self.supervisor {
            supervisor.shutdown().await;
        }
        tracing::info!("Layout worker pool shut down");
    }
}
