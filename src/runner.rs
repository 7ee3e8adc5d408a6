// src/runner.rs

//! Deadline-bounded execution of the external executable.
//!
//! One `ExecutionRequest` in, one `ExecutionResult` out:
//! - Completion before the deadline returns the real exit code and the
//!   captured stdout/stderr.
//! - Deadline expiry kills the whole child process tree and returns
//!   `timed_out = true` with no exit code. Output buffered before the kill
//!   signal lands is kept best-effort; nothing stronger is promised.
//! - A spawn refusal is a `SpawnFailure`; no partial result is produced.
//!
//! The `ProcessRunner` trait exists so the dispatcher can be exercised with
//! a recording fake that proves validation failures never reach a spawn.

use crate::error::Failure;
use crate::kill::{SysinfoTreeKiller, TreeKiller};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;

/// One planned invocation: tokens, working directory, deadline.
/// Built once per operation, owned by the runner for the duration of the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub deadline: Duration,
}

/// Captured outcome of one invocation. Final once returned; never retried.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Absent exactly when the deadline expired.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

pub trait ProcessRunner: Send + Sync {
    fn run(
        &self,
        request: ExecutionRequest,
    ) -> impl Future<Output = Result<ExecutionResult, Failure>> + Send;
}

/// Tokio-backed runner used in production.
pub struct TokioProcessRunner {
    killer: Arc<dyn TreeKiller>,
}

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self { killer: Arc::new(SysinfoTreeKiller) }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, request: ExecutionRequest) -> Result<ExecutionResult, Failure> {
        tracing::info!(
            program = %request.program.display(),
            args = ?request.args,
            deadline_secs = request.deadline.as_secs(),
            "running command"
        );
        if let Some(dir) = &request.cwd {
            tracing::info!(cwd = %dir.display(), "working directory");
        }

        let mut cmd = TokioCommand::new(&request.program);
        cmd.args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &request.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|source| Failure::SpawnFailure {
            program: request.program.display().to_string(),
            source,
        })?;

        let stdout_task = capture(child.stdout.take());
        let stderr_task = capture(child.stderr.take());

        match tokio::time::timeout(request.deadline, child.wait()).await {
            Ok(waited) => {
                let status = waited.map_err(|source| Failure::SpawnFailure {
                    program: request.program.display().to_string(),
                    source,
                })?;
                Ok(ExecutionResult {
                    exit_code: exit_code_of(status),
                    stdout: collect(stdout_task).await,
                    stderr: collect(stderr_task).await,
                    timed_out: false,
                })
            }
            Err(_elapsed) => {
                if let Some(pid) = child.id() {
                    // The process-table scan is synchronous; keep it off
                    // the async workers.
                    let killer = Arc::clone(&self.killer);
                    let _ = tokio::task::spawn_blocking(move || killer.kill_tree(pid)).await;
                }
                // Reaps the direct child; the pipes close and the capture
                // tasks finish with whatever they buffered.
                let _ = child.kill().await;

                tracing::warn!(
                    deadline_secs = request.deadline.as_secs(),
                    "deadline expired, child process tree terminated"
                );

                Ok(ExecutionResult {
                    exit_code: None,
                    stdout: collect(stdout_task).await,
                    stderr: collect(stderr_task).await,
                    timed_out: true,
                })
            }
        }
    }
}

fn capture(pipe: Option<impl AsyncReadExt + Unpin + Send + 'static>) -> JoinHandle<Vec<u8>> {
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        buf
    })
}

async fn collect(task: JoinHandle<Vec<u8>>) -> String {
    match task.await {
        Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => String::new(),
    }
}

/// On Unix a signal-killed child (outside of our own timeout kill) reports
/// the negative signal number, matching the convention of the runtime this
/// bridge replaced. Keeps "exit code absent iff timed out" exact.
fn exit_code_of(status: std::process::ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().or_else(|| status.signal().map(|signal| -signal))
    }
    #[cfg(not(unix))]
    {
        status.code()
    }
}
