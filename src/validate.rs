// src/validate.rs

//! Parameter validation against per-operation specs.
//!
//! Every supported operation carries a static `ParamSpec` table. Validation
//! runs completely before any process work starts:
//! - unknown parameter names are rejected (no silent misconfiguration)
//! - required parameters must be present and non-null
//! - typed values are checked, enumerated choices against their allowed set
//!
//! The output is a fully-typed `ValidatedOperation` with defaults filled in,
//! plus the per-call `CallOptions` shared by all operations. One operation
//! maps to exactly one validated form or one failure, never both.

use crate::error::Failure;
use crate::paths;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;

/// Raw parameter mapping as it arrives from the transport.
pub type RawParams = serde_json::Map<String, Value>;

/// The closed set of operations this bridge exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Version,
    InstallEnvironment,
    CreateDatabase,
    ScanDatabase,
    RunGeneric,
}

impl OperationKind {
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::Version => "version",
            OperationKind::InstallEnvironment => "install_environment",
            OperationKind::CreateDatabase => "create_database",
            OperationKind::ScanDatabase => "scan_database",
            OperationKind::RunGeneric => "run_generic",
        }
    }
}

impl FromStr for OperationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "version" => Ok(OperationKind::Version),
            "install_environment" => Ok(OperationKind::InstallEnvironment),
            "create_database" => Ok(OperationKind::CreateDatabase),
            "scan_database" => Ok(OperationKind::ScanDatabase),
            "run_generic" => Ok(OperationKind::RunGeneric),
            other => anyhow::bail!(
                "Unknown operation {:?}. Expected one of: version, install_environment, \
                 create_database, scan_database, run_generic",
                other
            ),
        }
    }
}

/* ---------------- parameter specs ---------------- */

pub const DECOMPILERS: &[&str] = &["procyon", "fernflower"];
pub const DEPENDENCY_MODES: &[&str] = &["none", "all"];

#[derive(Debug, Clone, Copy)]
enum ParamKind {
    Text,
    /// A filesystem path; accepted in either platform convention.
    Path,
    Bool,
    /// Non-negative integer.
    Int,
    TextList,
    /// One value out of a fixed, case-insensitive set.
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy)]
struct ParamSpec {
    name: &'static str,
    kind: ParamKind,
    required: bool,
}

const fn required(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec { name, kind, required: true }
}

const fn optional(name: &'static str, kind: ParamKind) -> ParamSpec {
    ParamSpec { name, kind, required: false }
}

/// Options every operation accepts alongside its own parameters.
const COMMON: &[ParamSpec] = &[
    optional("exe_path", ParamKind::Path),
    optional("cwd", ParamKind::Path),
    optional("timeout_seconds", ParamKind::Int),
];

const VERSION: &[ParamSpec] = &[];

const INSTALL_ENVIRONMENT: &[ParamSpec] = &[
    optional("jdk_url", ParamKind::Text),
    optional("ant_url", ParamKind::Text),
    optional("codeql_url", ParamKind::Text),
];

const CREATE_DATABASE: &[ParamSpec] = &[
    required("target_path", ParamKind::Path),
    optional("decompiler", ParamKind::Choice(DECOMPILERS)),
    optional("dependency_mode", ParamKind::Choice(DEPENDENCY_MODES)),
    optional("source_dir", ParamKind::Path),
    optional("parallel", ParamKind::Bool),
    optional("cache", ParamKind::Bool),
    optional("max_parallel", ParamKind::Int),
    optional("threads", ParamKind::Int),
];

const SCAN_DATABASE: &[ParamSpec] = &[
    required("database_path", ParamKind::Path),
    required("query_pack_path", ParamKind::Path),
    optional("parallel", ParamKind::Bool),
    optional("cache", ParamKind::Bool),
    optional("max_parallel", ParamKind::Int),
    optional("threads", ParamKind::Int),
];

const RUN_GENERIC: &[ParamSpec] = &[required("raw_args", ParamKind::TextList)];

fn spec_for(kind: OperationKind) -> &'static [ParamSpec] {
    match kind {
        OperationKind::Version => VERSION,
        OperationKind::InstallEnvironment => INSTALL_ENVIRONMENT,
        OperationKind::CreateDatabase => CREATE_DATABASE,
        OperationKind::ScanDatabase => SCAN_DATABASE,
        OperationKind::RunGeneric => RUN_GENERIC,
    }
}

/* ---------------- validated output ---------------- */

/// Per-call options shared by all operations.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Overrides the configured executable path for this call only.
    pub exe_path: Option<String>,
    /// Working directory for the child process.
    pub cwd: Option<PathBuf>,
    /// Overrides the per-operation deadline, in seconds.
    pub timeout_seconds: Option<u64>,
}

/// A fully-typed, defaulted operation ready for argument building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedOperation {
    Version,
    InstallEnvironment {
        jdk_url: Option<String>,
        ant_url: Option<String>,
        codeql_url: Option<String>,
    },
    CreateDatabase {
        target_path: String,
        decompiler: Option<String>,
        dependency_mode: Option<String>,
        source_dir: Option<String>,
        parallel: bool,
        cache: bool,
        max_parallel: Option<u64>,
        threads: Option<u64>,
    },
    ScanDatabase {
        database_path: String,
        query_pack_path: String,
        parallel: bool,
        cache: bool,
        max_parallel: Option<u64>,
        threads: Option<u64>,
    },
    RunGeneric {
        raw_args: Vec<String>,
    },
}

/* ---------------- validation ---------------- */

pub fn validate(
    kind: OperationKind,
    params: &RawParams,
) -> Result<(ValidatedOperation, CallOptions), Failure> {
    let table = spec_for(kind);

    for key in params.keys() {
        let known = table
            .iter()
            .chain(COMMON.iter())
            .any(|spec| spec.name == key);
        if !known {
            return Err(Failure::UnknownParameter(key.clone()));
        }
    }

    // JSON null counts as absent, matching how optional MCP arguments arrive.
    for spec in table.iter().filter(|s| s.required) {
        match params.get(spec.name) {
            None | Some(Value::Null) => return Err(Failure::MissingParameter(spec.name)),
            Some(_) => {}
        }
    }

    for spec in table.iter().chain(COMMON.iter()) {
        if let Some(value) = params.get(spec.name) {
            if !value.is_null() {
                check_value(spec, value)?;
            }
        }
    }

    let options = CallOptions {
        exe_path: text(params, "exe_path"),
        cwd: path(params, "cwd").map(PathBuf::from),
        timeout_seconds: integer(params, "timeout_seconds"),
    };

    let operation = match kind {
        OperationKind::Version => ValidatedOperation::Version,

        OperationKind::InstallEnvironment => ValidatedOperation::InstallEnvironment {
            jdk_url: text(params, "jdk_url"),
            ant_url: text(params, "ant_url"),
            codeql_url: text(params, "codeql_url"),
        },

        OperationKind::CreateDatabase => ValidatedOperation::CreateDatabase {
            target_path: path(params, "target_path")
                .ok_or(Failure::MissingParameter("target_path"))?,
            decompiler: choice(params, "decompiler"),
            dependency_mode: choice(params, "dependency_mode"),
            source_dir: path(params, "source_dir"),
            parallel: boolean(params, "parallel").unwrap_or(false),
            cache: boolean(params, "cache").unwrap_or(true),
            max_parallel: integer(params, "max_parallel"),
            threads: integer(params, "threads"),
        },

        OperationKind::ScanDatabase => ValidatedOperation::ScanDatabase {
            database_path: path(params, "database_path")
                .ok_or(Failure::MissingParameter("database_path"))?,
            query_pack_path: path(params, "query_pack_path")
                .ok_or(Failure::MissingParameter("query_pack_path"))?,
            parallel: boolean(params, "parallel").unwrap_or(false),
            cache: boolean(params, "cache").unwrap_or(true),
            max_parallel: integer(params, "max_parallel"),
            threads: integer(params, "threads"),
        },

        OperationKind::RunGeneric => ValidatedOperation::RunGeneric {
            raw_args: text_list(params, "raw_args")
                .ok_or(Failure::MissingParameter("raw_args"))?,
        },
    };

    Ok((operation, options))
}

fn check_value(spec: &ParamSpec, value: &Value) -> Result<(), Failure> {
    let ok = match spec.kind {
        ParamKind::Text | ParamKind::Path => value.is_string(),
        ParamKind::Bool => value.is_boolean(),
        ParamKind::Int => as_whole_u64(value).is_some(),
        ParamKind::TextList => value
            .as_array()
            .map(|items| items.iter().all(Value::is_string))
            .unwrap_or(false),
        ParamKind::Choice(allowed) => {
            let Some(raw) = value.as_str() else {
                return Err(invalid(spec.name, value, one_of(allowed)));
            };
            let canonical = raw.trim().to_lowercase();
            if allowed.contains(&canonical.as_str()) {
                return Ok(());
            }
            return Err(invalid(spec.name, value, one_of(allowed)));
        }
    };

    if ok {
        Ok(())
    } else {
        Err(invalid(spec.name, value, expected_for(spec.kind)))
    }
}

fn invalid(name: &'static str, value: &Value, expected: String) -> Failure {
    let rendered = match value.as_str() {
        Some(s) => s.to_string(),
        None => value.to_string(),
    };
    Failure::InvalidParameterValue { name, value: rendered, expected }
}

fn one_of(allowed: &[&str]) -> String {
    format!("one of: {}", allowed.join(", "))
}

fn expected_for(kind: ParamKind) -> String {
    match kind {
        ParamKind::Text | ParamKind::Path => "a string".to_string(),
        ParamKind::Bool => "a boolean".to_string(),
        ParamKind::Int => "a non-negative integer".to_string(),
        ParamKind::TextList => "a list of strings".to_string(),
        ParamKind::Choice(allowed) => one_of(allowed),
    }
}

/* ---------------- typed getters (post-check) ---------------- */

fn text(params: &RawParams, name: &str) -> Option<String> {
    params.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Path-valued parameters go through `paths::normalize` so either platform
/// spelling works everywhere. They are not absolutized or existence-checked;
/// that is the external tool's business.
fn path(params: &RawParams, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(paths::normalize)
}

fn choice(params: &RawParams, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_lowercase())
}

fn boolean(params: &RawParams, name: &str) -> Option<bool> {
    params.get(name).and_then(Value::as_bool)
}

fn integer(params: &RawParams, name: &str) -> Option<u64> {
    params.get(name).and_then(as_whole_u64)
}

/// Some clients serialize counts as JSON floats; `600.0` still means 600.
fn as_whole_u64(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

fn text_list(params: &RawParams, name: &str) -> Option<Vec<String>> {
    let items = params.get(name)?.as_array()?;
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> RawParams {
        value.as_object().expect("test params must be an object").clone()
    }

    #[test]
    fn missing_required_parameter_is_named() {
        let err = validate(
            OperationKind::ScanDatabase,
            &params(json!({ "database_path": "/tmp/db" })),
        )
        .unwrap_err();
        assert!(matches!(err, Failure::MissingParameter("query_pack_path")));
    }

    #[test]
    fn null_counts_as_absent_for_required_parameters() {
        let err = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": null })),
        )
        .unwrap_err();
        assert!(matches!(err, Failure::MissingParameter("target_path")));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let err = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": "app.jar", "decompilre": "procyon" })),
        )
        .unwrap_err();
        match err {
            Failure::UnknownParameter(name) => assert_eq!(name, "decompilre"),
            other => panic!("expected UnknownParameter, got {other:?}"),
        }
    }

    #[test]
    fn choice_outside_allowed_set_is_rejected() {
        let err = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": "app.jar", "decompiler": "jadx" })),
        )
        .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("decompiler"));
        assert!(text.contains("procyon"));
    }

    #[test]
    fn choice_is_case_insensitive_and_trimmed() {
        let (op, _) = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": "app.jar", "decompiler": " Fernflower " })),
        )
        .expect("valid");
        match op {
            ValidatedOperation::CreateDatabase { decompiler, .. } => {
                assert_eq!(decompiler.as_deref(), Some("fernflower"));
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn defaults_fill_in_for_omitted_optionals() {
        let (op, options) = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": "app.jar" })),
        )
        .expect("valid");
        match op {
            ValidatedOperation::CreateDatabase { parallel, cache, decompiler, .. } => {
                assert!(!parallel);
                assert!(cache);
                assert!(decompiler.is_none());
            }
            other => panic!("unexpected operation {other:?}"),
        }
        assert!(options.timeout_seconds.is_none());
        assert!(options.cwd.is_none());
    }

    #[test]
    fn whole_number_floats_count_as_integers() {
        let (_, options) = validate(
            OperationKind::Version,
            &params(json!({ "timeout_seconds": 600.0 })),
        )
        .expect("whole-number float accepted");
        assert_eq!(options.timeout_seconds, Some(600));
    }

    #[test]
    fn fractional_or_negative_numbers_are_rejected() {
        let err = validate(
            OperationKind::Version,
            &params(json!({ "timeout_seconds": 600.5 })),
        )
        .unwrap_err();
        assert!(matches!(err, Failure::InvalidParameterValue { name: "timeout_seconds", .. }));

        let err = validate(
            OperationKind::Version,
            &params(json!({ "timeout_seconds": -1 })),
        )
        .unwrap_err();
        assert!(matches!(err, Failure::InvalidParameterValue { name: "timeout_seconds", .. }));
    }

    #[test]
    fn wrong_type_is_invalid_parameter_value() {
        let err = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": "app.jar", "parallel": "yes" })),
        )
        .unwrap_err();
        assert!(matches!(err, Failure::InvalidParameterValue { name: "parallel", .. }));
    }

    #[test]
    fn raw_args_must_be_a_list_of_strings() {
        let err = validate(
            OperationKind::RunGeneric,
            &params(json!({ "raw_args": ["-install", 42] })),
        )
        .unwrap_err();
        assert!(matches!(err, Failure::InvalidParameterValue { name: "raw_args", .. }));
    }

    #[test]
    fn common_options_are_accepted_on_every_operation() {
        let (_, options) = validate(
            OperationKind::Version,
            &params(json!({ "exe_path": "/opt/codeql-n1ght", "timeout_seconds": 30 })),
        )
        .expect("valid");
        assert_eq!(options.exe_path.as_deref(), Some("/opt/codeql-n1ght"));
        assert_eq!(options.timeout_seconds, Some(30));
    }

    #[cfg(unix)]
    #[test]
    fn path_parameters_are_normalized() {
        let (op, _) = validate(
            OperationKind::CreateDatabase,
            &params(json!({ "target_path": r"J:\apps\target.jar" })),
        )
        .expect("valid");
        match op {
            ValidatedOperation::CreateDatabase { target_path, .. } => {
                assert_eq!(target_path, "/j:/apps/target.jar");
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn operation_names_round_trip() {
        for kind in [
            OperationKind::Version,
            OperationKind::InstallEnvironment,
            OperationKind::CreateDatabase,
            OperationKind::ScanDatabase,
            OperationKind::RunGeneric,
        ] {
            assert_eq!(kind.name().parse::<OperationKind>().expect("parses"), kind);
        }
    }
}
