//! FIFO queue of pending layout jobs shared by all dispatch loops.
//!
//! Submitters call [`JobQueue::enqueue`], which never blocks. Each dispatch
//! loop awaits [`JobQueue::dequeue`], which suspends while the queue is
//! empty. A job is popped under the lock, so it reaches exactly one loop.
//!
//! A job may own the scratch files its worker reads and writes. They travel
//! with the job and come back in its [`Completion`], so a submitter that
//! stops waiting never deletes files a worker is still using.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lgl_core::JobRequest;
use tokio::sync::{oneshot, Notify};
use uuid::Uuid;

use crate::api::RpcError;
use crate::scratch::ScratchFiles;

/// What a worker answered for one job.
pub type JobResult = Result<serde_json::Value, RpcError>;

/// A resolved job: the worker's answer and the files the job owned.
#[derive(Debug)]
pub struct Completion {
    pub result: JobResult,
    pub files: Option<ScratchFiles>,
}

/// One queued layout request and the handle that resolves it.
#[derive(Debug)]
pub struct Job {
    pub id: Uuid,
    pub request: JobRequest,
    files: Option<ScratchFiles>,
    reply: oneshot::Sender<Completion>,
}

impl Job {
    /// Create a job and the receiver its submitter awaits.
    pub fn new(request: JobRequest) -> (Self, oneshot::Receiver<Completion>) {
        let (reply, rx) = oneshot::channel();
        let job = Self {
            id: Uuid::new_v4(),
            request,
            files: None,
            reply,
        };
        (job, rx)
    }

    /// Hand the job its scratch files. If the job is dropped or its
    /// submitter is gone when it resolves, the files are removed then.
    pub fn with_files(mut self, files: ScratchFiles) -> Self {
        self.files = Some(files);
        self
    }

    /// The submitter has stopped waiting for this job.
    pub fn is_abandoned(&self) -> bool {
        self.reply.is_closed()
    }

    /// Resolve the job. Consumes it, so a job resolves at most once.
    ///
    /// Returns `false` if the submitter stopped waiting.
    pub fn resolve(self, result: JobResult) -> bool {
        let Self { files, reply, .. } = self;
        reply.send(Completion { result, files }).is_ok()
    }
}

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    closed: bool,
}

/// Shared job queue.
#[derive(Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
    available: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job to the tail. Jobs enqueued after [`close`](Self::close)
    /// are dropped, which resolves their receivers with a closed channel.
    pub fn enqueue(&self, job: Job) {
        {
            let mut state = self.lock();
            if state.closed {
                tracing::warn!(job_id = %job.id, "Job queue closed, dropping job");
                return;
            }
            state.jobs.push_back(job);
        }
        self.available.notify_one();
    }

    /// Take the job at the head, waiting for one if the queue is empty.
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn dequeue(&self) -> Option<Job> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            // Register before checking, so a wake-up between the check and
            // the await is not lost.
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(job) = state.jobs.pop_front() {
                    return Some(job);
                }
                if state.closed {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Number of jobs waiting for a loop.
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting jobs and wake every waiting loop. Jobs already queued
    /// can still be dequeued.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
