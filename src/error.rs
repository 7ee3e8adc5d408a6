// src/error.rs

//! Failure taxonomy for the dispatch layer.
//!
//! Everything that can stop an operation before its process completes is a
//! `Failure`. Two things deliberately are NOT failures:
//! - A timed-out child: reported through `ExecutionResult::timed_out`.
//! - A non-zero exit code: a completed process with a failing exit code is a
//!   valid result; the caller interprets exit-code semantics.
//!
//! Failures never escape the dispatcher; each one is converted into the
//! uniform response with `returncode = null`, `timeout = false`, and the
//! failure text in `stderr`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Failure {
    /// A required parameter was absent (or explicitly null).
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A parameter name outside the operation's spec was supplied.
    ///
    /// Rejected rather than ignored, so a misspelled parameter cannot
    /// silently change what gets executed.
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    /// A parameter had the wrong type or a value outside its allowed set.
    #[error("Invalid {name}: {value}. Expected {expected}")]
    InvalidParameterValue {
        name: &'static str,
        value: String,
        expected: String,
    },

    /// The configured executable does not exist on disk.
    #[error("Executable not found: {0}")]
    ExecutableNotFound(String),

    /// The OS refused to launch the child process.
    ///
    /// Distinct from `ExecutableNotFound`: the existence check can pass and
    /// the spawn still fail (permissions, or the file vanished in between).
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailure {
        program: String,
        #[source]
        source: std::io::Error,
    },
}
