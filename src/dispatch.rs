// src/dispatch.rs

//! The operation dispatcher: validator -> builder -> resolver -> runner.
//!
//! Per request the flow is a straight line with no revisited state:
//! received -> validating -> building args -> resolving path -> executing,
//! and every path lands in exactly one terminal outcome shaped into the
//! uniform four-field response. No lower-layer failure escapes to the
//! transport as a fault.
//!
//! The dispatcher holds only immutable state (config + runner), so the
//! transport may drive any number of requests concurrently; each request
//! exclusively owns its child process, buffers, and deadline timer.

use crate::args::build_args;
use crate::config::Config;
use crate::error::Failure;
use crate::execution_id::ExecutionId;
use crate::paths;
use crate::runner::{ExecutionRequest, ExecutionResult, ProcessRunner, TokioProcessRunner};
use crate::validate::{validate, OperationKind, RawParams};
use serde::Serialize;
use std::time::Duration;
use tracing::Instrument;

/// The uniform response shape. All four fields are always present;
/// `returncode` is null exactly when `timeout` is true, and also on
/// failures that never reached a spawn (where `timeout` stays false and
/// `stderr` names the failure).
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub returncode: Option<i64>,
    pub stdout: String,
    pub stderr: String,
    pub timeout: bool,
}

impl ToolResponse {
    fn failure(failure: &Failure) -> Self {
        Self {
            returncode: None,
            stdout: String::new(),
            stderr: failure.to_string(),
            timeout: false,
        }
    }

    fn completed(result: ExecutionResult, deadline_secs: u64) -> Self {
        if result.timed_out {
            let notice = format!("Process timeout after {} seconds", deadline_secs);
            let stderr = if result.stderr.is_empty() {
                notice
            } else {
                format!("{}\n{}", result.stderr, notice)
            };
            Self {
                returncode: None,
                stdout: result.stdout,
                stderr,
                timeout: true,
            }
        } else {
            Self {
                returncode: result.exit_code.map(i64::from),
                stdout: result.stdout,
                stderr: result.stderr,
                timeout: false,
            }
        }
    }
}

pub struct Dispatcher<R = TokioProcessRunner> {
    config: Config,
    runner: R,
}

impl Dispatcher<TokioProcessRunner> {
    pub fn new(config: Config) -> Self {
        Self { config, runner: TokioProcessRunner::new() }
    }
}

impl<R: ProcessRunner> Dispatcher<R> {
    pub fn with_runner(config: Config, runner: R) -> Self {
        Self { config, runner }
    }

    /// Dispatch one operation and shape the outcome.
    ///
    /// Validation and path resolution happen before any process is spawned;
    /// on their failure the runner is never touched. A non-zero exit code is
    /// a completed result, not a failure.
    pub async fn dispatch(&self, kind: OperationKind, params: RawParams) -> ToolResponse {
        let id = ExecutionId::new();
        let span = tracing::info_span!("operation", id = %id, name = kind.name());
        self.dispatch_inner(kind, params).instrument(span).await
    }

    async fn dispatch_inner(&self, kind: OperationKind, params: RawParams) -> ToolResponse {
        let (operation, options) = match validate(kind, &params) {
            Ok(validated) => validated,
            Err(failure) => {
                tracing::warn!(%failure, "validation failed");
                return ToolResponse::failure(&failure);
            }
        };

        let args = build_args(&operation);

        let configured = options
            .exe_path
            .as_deref()
            .unwrap_or(&self.config.executable);
        let program = match paths::resolve_executable(configured) {
            Ok(program) => program,
            Err(failure) => {
                tracing::warn!(%failure, "executable resolution failed");
                return ToolResponse::failure(&failure);
            }
        };

        let deadline_secs = options
            .timeout_seconds
            .unwrap_or_else(|| self.config.timeouts.for_operation(kind));

        let request = ExecutionRequest {
            program,
            args,
            cwd: options.cwd,
            deadline: Duration::from_secs(deadline_secs),
        };

        match self.runner.run(request).await {
            Ok(result) => {
                tracing::info!(
                    returncode = ?result.exit_code,
                    timed_out = result.timed_out,
                    "operation finished"
                );
                ToolResponse::completed(result, deadline_secs)
            }
            Err(failure) => {
                tracing::warn!(%failure, "spawn failed");
                ToolResponse::failure(&failure)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// Fake runner that records every request and returns a canned result.
    #[derive(Clone, Default)]
    struct RecordingRunner {
        requests: Arc<Mutex<Vec<ExecutionRequest>>>,
    }

    impl RecordingRunner {
        fn requests(&self) -> Vec<ExecutionRequest> {
            self.requests.lock().expect("lock").clone()
        }
    }

    impl ProcessRunner for RecordingRunner {
        async fn run(&self, request: ExecutionRequest) -> Result<ExecutionResult, Failure> {
            self.requests.lock().expect("lock").push(request);
            Ok(ExecutionResult {
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
                timed_out: false,
            })
        }
    }

    fn params(value: serde_json::Value) -> RawParams {
        value.as_object().expect("object").clone()
    }

    fn config_with_exe(executable: &str) -> Config {
        Config { executable: executable.to_string(), ..Config::default() }
    }

    /// Drops a fake executable into a temp dir and returns (guard, config).
    #[cfg(unix)]
    fn fake_executable(script: &str) -> (tempfile::TempDir, Config) {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let exe = dir.path().join("codeql-n1ght");
        std::fs::write(&exe, script).expect("write script");
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).expect("chmod");

        let cfg = config_with_exe(exe.to_str().expect("utf-8 path"));
        (dir, cfg)
    }

    #[tokio::test]
    async fn validation_failure_never_reaches_the_runner() {
        let runner = RecordingRunner::default();
        let dispatcher = Dispatcher::with_runner(config_with_exe("/tmp/absent"), runner.clone());

        let response = dispatcher
            .dispatch(
                OperationKind::ScanDatabase,
                params(json!({ "database_path": "/tmp/db" })),
            )
            .await;

        assert_eq!(response.returncode, None);
        assert!(!response.timeout);
        assert!(response.stderr.contains("query_pack_path"));
        assert!(runner.requests().is_empty(), "a process was spawned despite invalid input");
    }

    #[tokio::test]
    async fn missing_executable_short_circuits_before_spawn() {
        let runner = RecordingRunner::default();
        let dispatcher =
            Dispatcher::with_runner(config_with_exe("/no/such/codeql-n1ght"), runner.clone());

        let response = dispatcher.dispatch(OperationKind::Version, RawParams::new()).await;

        assert_eq!(response.returncode, None);
        assert!(!response.timeout);
        assert!(response.stderr.starts_with("Executable not found:"));
        assert!(runner.requests().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn per_call_timeout_wins_over_the_config_table() {
        let runner = RecordingRunner::default();
        let dir = tempfile::tempdir().expect("tempdir");
        let exe = dir.path().join("tool");
        std::fs::write(&exe, b"").expect("write");
        let dispatcher = Dispatcher::with_runner(
            config_with_exe(exe.to_str().expect("utf-8 path")),
            runner.clone(),
        );

        dispatcher
            .dispatch(
                OperationKind::CreateDatabase,
                params(json!({ "target_path": "app.jar", "timeout_seconds": 5 })),
            )
            .await;
        dispatcher
            .dispatch(
                OperationKind::CreateDatabase,
                params(json!({ "target_path": "app.jar" })),
            )
            .await;

        let requests = runner.requests();
        assert_eq!(requests[0].deadline, Duration::from_secs(5));
        assert_eq!(requests[1].deadline, Duration::from_secs(72_000));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn create_database_end_to_end_against_a_fake_executable() {
        let (_guard, cfg) = fake_executable("#!/bin/sh\nprintf ok\nexit 0\n");
        let dispatcher = Dispatcher::new(cfg);

        let response = dispatcher
            .dispatch(
                OperationKind::CreateDatabase,
                params(json!({
                    "target_path": "/tmp/app.jar",
                    "decompiler": "procyon",
                    "dependency_mode": "none",
                })),
            )
            .await;

        assert_eq!(response.returncode, Some(0));
        assert_eq!(response.stdout, "ok");
        assert_eq!(response.stderr, "");
        assert!(!response.timeout);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_completed_result() {
        let (_guard, cfg) = fake_executable("#!/bin/sh\nprintf 'boom' >&2\nexit 2\n");
        let dispatcher = Dispatcher::new(cfg);

        let response = dispatcher.dispatch(OperationKind::Version, RawParams::new()).await;

        assert_eq!(response.returncode, Some(2));
        assert_eq!(response.stderr, "boom");
        assert!(!response.timeout);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_response_matches_the_contract() {
        let (_guard, cfg) = fake_executable("#!/bin/sh\nsleep 30\n");
        let dispatcher = Dispatcher::new(cfg);

        let response = dispatcher
            .dispatch(
                OperationKind::RunGeneric,
                params(json!({ "raw_args": [], "timeout_seconds": 1 })),
            )
            .await;

        assert_eq!(response.returncode, None);
        assert!(response.timeout);
        assert!(response.stderr.contains("Process timeout after 1 seconds"));
    }

    #[test]
    fn response_serializes_with_all_four_fields() {
        let rendered = serde_json::to_value(ToolResponse {
            returncode: None,
            stdout: String::new(),
            stderr: "Missing required parameter: target_path".to_string(),
            timeout: false,
        })
        .expect("serializes");

        assert_eq!(
            rendered,
            json!({
                "returncode": null,
                "stdout": "",
                "stderr": "Missing required parameter: target_path",
                "timeout": false,
            })
        );
    }
}
