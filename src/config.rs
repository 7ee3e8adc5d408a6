// src/config.rs

//! Configuration for the bridge.
//!
//! Everything lives in an optional `qlbridge.yaml`:
//!
//! ```yaml
//! executable: J:\mcp\codeql-n1ght.exe   # or /j:/mcp/codeql-n1ght.exe
//! timeouts:
//!   create_database: 36000
//! ```
//!
//! A missing file means built-in defaults; `QLBRIDGE_EXECUTABLE` in the
//! environment (or a `.env` file) overrides the executable last. The loaded
//! `Config` is handed to the dispatcher at construction and never mutated
//! afterwards; there is no ambient process-wide configuration.

use crate::validate::OperationKind;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Default executable location, accepted in either path convention.
pub const DEFAULT_EXECUTABLE: &str = r"J:\mcp\codeql-n1ght.exe";

// Default deadlines in seconds. Short operations get minutes; database
// creation and scanning run static analysis over large artifacts and get
// on the order of a day.
const DEFAULT_VERSION_SECS: u64 = 60;
const DEFAULT_INSTALL_SECS: u64 = 3_600;
const DEFAULT_CREATE_DATABASE_SECS: u64 = 72_000;
const DEFAULT_SCAN_DATABASE_SECS: u64 = 720_000;
const DEFAULT_RUN_GENERIC_SECS: u64 = 600;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Path to the codeql-n1ght executable.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Per-operation deadline overrides in seconds.
    #[serde(default)]
    pub timeouts: TimeoutTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            timeouts: TimeoutTable::default(),
        }
    }
}

fn default_executable() -> String {
    DEFAULT_EXECUTABLE.to_string()
}

/// Optional per-operation deadline overrides.
///
/// Unset entries fall back to the built-in defaults. A per-call
/// `timeout_seconds` parameter still wins over both.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeoutTable {
    pub version: Option<u64>,
    pub install_environment: Option<u64>,
    pub create_database: Option<u64>,
    pub scan_database: Option<u64>,
    pub run_generic: Option<u64>,
}

impl TimeoutTable {
    pub fn for_operation(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::Version => self.version.unwrap_or(DEFAULT_VERSION_SECS),
            OperationKind::InstallEnvironment => {
                self.install_environment.unwrap_or(DEFAULT_INSTALL_SECS)
            }
            OperationKind::CreateDatabase => {
                self.create_database.unwrap_or(DEFAULT_CREATE_DATABASE_SECS)
            }
            OperationKind::ScanDatabase => {
                self.scan_database.unwrap_or(DEFAULT_SCAN_DATABASE_SECS)
            }
            OperationKind::RunGeneric => self.run_generic.unwrap_or(DEFAULT_RUN_GENERIC_SECS),
        }
    }
}

impl Config {
    /// Load and parse a YAML config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut cfg: Config =
            serde_yaml::from_str(&raw).context("Failed to parse YAML config")?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    /// The server must come up with zero on-disk configuration.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut cfg = Config::default();
            cfg.apply_env();
            Ok(cfg)
        }
    }

    fn apply_env(&mut self) {
        if let Ok(exe) = std::env::var("QLBRIDGE_EXECUTABLE") {
            if !exe.trim().is_empty() {
                self.executable = exe;
            }
        }
    }
}
