// src/paths.rs

//! Cross-platform path normalization and executable resolution.
//!
//! The analysis executable is typically configured on Windows as
//! `J:\mcp\codeql-n1ght.exe`, but MCP clients running under WSL or a Unix
//! mount hand the same location over as `/j:/mcp/codeql-n1ght.exe`. Both
//! spellings must resolve to one canonical, platform-native path.
//!
//! `normalize` is idempotent: feeding its output back in returns the same
//! string.

use crate::error::Failure;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// `J:\...` or `J:/...` — a drive-letter prefix.
fn drive_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]:[\\/]").expect("static regex"))
}

/// `/j:/...` — a mount-style prefix with the drive letter after the slash.
fn mount_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^/[A-Za-z]:(/|$)").expect("static regex"))
}

/// Rewrite `path` into the host platform's native convention.
///
/// - Drive form (`J:\mcp\tool.exe`) and mount form (`/j:/mcp/tool.exe`)
///   converge to the same canonical result.
/// - Anything else passes through unchanged.
pub fn normalize(path: &str) -> String {
    let path = path.trim();

    if drive_prefix().is_match(path) {
        return from_drive_form(path);
    }
    if mount_prefix().is_match(path) {
        return from_mount_form(path);
    }
    path.to_string()
}

#[cfg(windows)]
fn from_drive_form(path: &str) -> String {
    let mut out = path.replace('/', "\\");
    out.replace_range(..1, &path[..1].to_uppercase());
    out
}

#[cfg(not(windows))]
fn from_drive_form(path: &str) -> String {
    // "J:\mcp\tool.exe" -> "/j:/mcp/tool.exe"
    let drive = path[..1].to_lowercase();
    let rest = path[2..].replace('\\', "/");
    format!("/{}:{}", drive, rest)
}

#[cfg(windows)]
fn from_mount_form(path: &str) -> String {
    // "/j:/mcp/tool.exe" -> "J:\mcp\tool.exe"
    let stripped = &path[1..];
    let mut out = stripped.replace('/', "\\");
    out.replace_range(..1, &stripped[..1].to_uppercase());
    out
}

#[cfg(not(windows))]
fn from_mount_form(path: &str) -> String {
    let mut out = path.to_string();
    out.replace_range(1..2, &path[1..2].to_lowercase());
    out
}

/// Normalize `configured`, make it absolute, and require it to exist.
///
/// Absence is a tagged `ExecutableNotFound` failure, never a panic: the
/// dispatcher reports it in the uniform response without spawning anything.
pub fn resolve_executable(configured: &str) -> Result<PathBuf, Failure> {
    let normalized = normalize(configured);
    let candidate = Path::new(&normalized);
    let absolute = std::path::absolute(candidate)
        .unwrap_or_else(|_| candidate.to_path_buf());

    if absolute.is_file() {
        Ok(absolute)
    } else {
        Err(Failure::ExecutableNotFound(absolute.display().to_string()))
    }
}
