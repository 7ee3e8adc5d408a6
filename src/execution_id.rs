// src/execution_id.rs

//! Identifier threaded through the tracing span of one dispatched operation.
//! Correlates validation, spawn, and outcome log lines when the transport
//! delivers requests concurrently.

use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ExecutionId(String);

impl ExecutionId {
    pub fn new() -> Self {
        Self(format!("op_{}", Uuid::new_v4()))
    }
}

impl Default for ExecutionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
