//! Launches and watches the external layout worker processes.
//!
//! [`Supervisor::start`] runs the configured kill command, reserves one free
//! loopback port per worker, spawns each worker with its port as the last
//! argument, and waits for a stdout line containing `port <N>`. Stderr
//! output, an early exit, or a missed deadline before that line aborts the
//! whole start and kills any worker already launched.
//!
//! Once ready, each worker gets a monitor task that logs its output and
//! flips its [`WorkerHandle`] to dead when the process exits. Workers are
//! never restarted.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::net::TcpListener;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{PoolConfig, WorkerCommand};

/// How long shutdown waits for each monitor to kill its worker.
const MONITOR_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// A running (or formerly running) layout worker.
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    slot: usize,
    port: u16,
    pid: Option<u32>,
    alive: watch::Receiver<bool>,
}

/// Owns the monitor tasks of every launched worker.
pub struct Supervisor {
    cancel: CancellationToken,
    monitors: Mutex<Vec<JoinHandle<()>>>,
}

/// Why the pool could not be started.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    #[error("Failed to run kill command `{command}`: {source}")]
    KillCommand {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to obtain a free port: {0}")]
    PortAllocation(#[source] std::io::Error),

    #[error("Failed to spawn worker {slot} (`{program}`): {source}")]
    Spawn {
        slot: usize,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker {slot} on port {port} wrote to stderr before becoming ready: {output}")]
    StderrBeforeReady {
        slot: usize,
        port: u16,
        output: String,
    },

    #[error("Worker {slot} on port {port} exited before becoming ready ({status})")]
    ExitedBeforeReady {
        slot: usize,
        port: u16,
        status: String,
    },

    #[error("Worker {slot} on port {port} was not ready after {}s", timeout.as_secs())]
    ReadyTimeout {
        slot: usize,
        port: u16,
        timeout: Duration,
    },

    #[error("Failed to read output of worker {slot}: {source}")]
    Output {
        slot: usize,
        #[source]
        source: std::io::Error,
    },
}

impl WorkerHandle {
    /// A handle for a worker this process did not launch. It is always
    /// reported alive.
    pub fn external(slot: usize, port: u16) -> Self {
        let (_tx, alive) = watch::channel(true);
        Self {
            slot,
            port,
            pid: None,
            alive,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.borrow()
    }

    /// Wait until the worker process has exited.
    ///
    /// Returns immediately for [`external`](Self::external) handles, which
    /// nothing monitors.
    pub async fn exited(&self) {
        let mut alive = self.alive.clone();
        let _ = alive.wait_for(|alive| !*alive).await;
    }
}

impl Supervisor {
    /// Launch `config.worker_count` workers and wait for all of them.
    pub async fn start(config: &PoolConfig) -> Result<(Self, Vec<WorkerHandle>), SupervisorError> {
        if let Some(command) = &config.kill_command {
            run_kill_command(command).await?;
        }

        let ports = allocate_ports(config.worker_count).await?;
        let supervisor = Self {
            cancel: CancellationToken::new(),
            monitors: Mutex::new(Vec::with_capacity(ports.len())),
        };

        let mut workers = Vec::with_capacity(ports.len());
        for (slot, port) in ports.into_iter().enumerate() {
            match launch(slot, port, &config.worker, config.startup_timeout, &supervisor.cancel)
                .await
            {
                Ok((handle, monitor)) => {
                    supervisor.monitors.lock().await.push(monitor);
                    workers.push(handle);
                }
                Err(e) => {
                    tracing::error!(slot, port, error = %e, "Layout worker failed to start");
                    supervisor.shutdown().await;
                    return Err(e);
                }
            }
        }

        Ok((supervisor, workers))
    }

    /// Kill every worker and wait for the monitors to finish.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let mut monitors = self.monitors.lock().await;
        for monitor in monitors.drain(..) {
            let _ = tokio::time::timeout(MONITOR_SHUTDOWN_TIMEOUT, monitor).await;
        }
    }
}

/// Run the configured kill command to completion.
///
/// Only a failure to spawn is fatal; kill scripts commonly exit non-zero
/// when there was nothing to kill.
pub async fn run_kill_command(command: &[String]) -> Result<(), SupervisorError> {
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|source| SupervisorError::KillCommand {
            command: command.join(" "),
            source,
        })?;

    if status.success() {
        tracing::info!(command = %command.join(" "), "Stale layout workers killed");
    } else {
        tracing::warn!(command = %command.join(" "), %status, "Kill command exited unsuccessfully");
    }
    Ok(())
}

/// Reserve `count` distinct free loopback ports.
///
/// All listeners are held until every port is known, so the OS cannot hand
/// out the same port twice; they are released before the workers bind.
pub async fn allocate_ports(count: usize) -> Result<Vec<u16>, SupervisorError> {
    let mut listeners = Vec::with_capacity(count);
    for _ in 0..count {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(SupervisorError::PortAllocation)?;
        listeners.push(listener);
    }

    listeners
        .iter()
        .map(|l| l.local_addr().map(|addr| addr.port()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(SupervisorError::PortAllocation)
}

/// `true` if a worker stdout line announces readiness on `port`.
pub fn is_ready_line(line: &str, port: u16) -> bool {
    line.contains(&format!("port {port}"))
}

async fn launch(
    slot: usize,
    port: u16,
    command: &WorkerCommand,
    startup_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<(WorkerHandle, JoinHandle<()>), SupervisorError> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .arg(port.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &command.env_vars {
        cmd.env(key, value);
    }
    if let Some(dir) = &command.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
        slot,
        program: command.program.clone(),
        source,
    })?;
    let pid = child.id();
    tracing::info!(slot, port, pid, program = %command.program, "Layout worker spawned");

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(SupervisorError::Output {
            slot,
            source: std::io::Error::other("stdout/stderr were not captured"),
        });
    };
    let mut stdout = BufReader::new(stdout).lines();
    let mut stderr = BufReader::new(stderr).lines();

    // On any error `child` is dropped here, which kills it.
    match tokio::time::timeout(
        startup_timeout,
        wait_until_ready(slot, port, &mut child, &mut stdout, &mut stderr),
    )
    .await
    {
        Ok(result) => result?,
        Err(_elapsed) => {
            return Err(SupervisorError::ReadyTimeout {
                slot,
                port,
                timeout: startup_timeout,
            })
        }
    }
    tracing::info!(slot, port, "Layout worker ready");

    let (alive_tx, alive) = watch::channel(true);
    let monitor = tokio::spawn(monitor(
        slot,
        port,
        child,
        stdout,
        stderr,
        alive_tx,
        cancel.child_token(),
    ));

    let handle = WorkerHandle {
        slot,
        port,
        pid,
        alive,
    };
    Ok((handle, monitor))
}

/// Read the worker's output until the readiness line appears.
async fn wait_until_ready(
    slot: usize,
    port: u16,
    child: &mut Child,
    stdout: &mut Lines<BufReader<ChildStdout>>,
    stderr: &mut Lines<BufReader<ChildStderr>>,
) -> Result<(), SupervisorError> {
    let mut stderr_open = true;

    loop {
        tokio::select! {
            line = stdout.next_line() => match line {
                Ok(Some(line)) => {
                    tracing::debug!(slot, port, "worker stdout: {line}");
                    if is_ready_line(&line, port) {
                        return Ok(());
                    }
                }
                Ok(None) => {
                    let status = child.wait().await;
                    return Err(exited_before_ready(slot, port, status));
                }
                Err(source) => return Err(SupervisorError::Output { slot, source }),
            },
            line = stderr.next_line(), if stderr_open => match line {
                Ok(Some(output)) => {
                    return Err(SupervisorError::StderrBeforeReady { slot, port, output });
                }
                Ok(None) => stderr_open = false,
                Err(source) => return Err(SupervisorError::Output { slot, source }),
            },
            status = child.wait() => {
                return Err(exited_before_ready(slot, port, status));
            }
        }
    }
}

fn exited_before_ready(
    slot: usize,
    port: u16,
    status: std::io::Result<ExitStatus>,
) -> SupervisorError {
    SupervisorError::ExitedBeforeReady {
        slot,
        port,
        status: match status {
            Ok(status) => status.to_string(),
            Err(e) => format!("wait failed: {e}"),
        },
    }
}

/// Watch a ready worker until it exits or the pool shuts down.
async fn monitor(
    slot: usize,
    port: u16,
    mut child: Child,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr: Lines<BufReader<ChildStderr>>,
    alive: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    let stdout_task = tokio::spawn(log_lines(slot, stdout, false));
    let stderr_task = tokio::spawn(log_lines(slot, stderr, true));

    tokio::select! {
        status = child.wait() => match status {
            Ok(status) => tracing::error!(slot, port, %status, "Layout worker exited"),
            Err(e) => tracing::error!(slot, port, error = %e, "Lost track of layout worker"),
        },
        _ = cancel.cancelled() => {
            if let Err(e) = child.kill().await {
                tracing::warn!(slot, port, error = %e, "Failed to kill layout worker");
            } else {
                tracing::info!(slot, port, "Layout worker stopped");
            }
        }
    }

    let _ = alive.send(false);
    stdout_task.abort();
    stderr_task.abort();
}

async fn log_lines<R: AsyncRead + Unpin>(
    slot: usize,
    mut lines: Lines<BufReader<R>>,
    is_stderr: bool,
) {
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            tracing::warn!(slot, "worker stderr: {line}");
        } else {
            tracing::debug!(slot, "worker stdout: {line}");
        }
    }
}
