// src/args.rs

//! Maps a validated operation onto the exact token sequence the
//! codeql-n1ght CLI expects.
//!
//! This is a pure function: the same validated operation always yields a
//! byte-identical token list, so tests can assert on the argument vector
//! instead of on process behavior. Flag order is fixed per operation.
//!
//! `run_generic` is the explicit escape hatch: the caller-supplied tokens
//! pass through verbatim, with no implicit flags injected.

use crate::validate::ValidatedOperation;

pub fn build_args(operation: &ValidatedOperation) -> Vec<String> {
    match operation {
        ValidatedOperation::Version => vec!["--version".to_string()],

        ValidatedOperation::InstallEnvironment { jdk_url, ant_url, codeql_url } => {
            let mut args = vec!["-install".to_string()];
            push_value(&mut args, "-jdk", jdk_url.as_deref());
            push_value(&mut args, "-ant", ant_url.as_deref());
            push_value(&mut args, "-codeql", codeql_url.as_deref());
            args
        }

        ValidatedOperation::CreateDatabase {
            target_path,
            decompiler,
            dependency_mode,
            source_dir,
            parallel,
            cache,
            max_parallel,
            threads,
        } => {
            let mut args = vec!["-database".to_string(), target_path.clone()];
            push_value(&mut args, "-decompiler", decompiler.as_deref());
            push_value(&mut args, "-dir", source_dir.as_deref());
            push_value(&mut args, "-deps", dependency_mode.as_deref());
            push_parallelism(&mut args, *parallel, *cache, *max_parallel, *threads);
            args
        }

        ValidatedOperation::ScanDatabase {
            database_path,
            query_pack_path,
            parallel,
            cache,
            max_parallel,
            threads,
        } => {
            let mut args = vec![
                "-scan".to_string(),
                "-db".to_string(),
                database_path.clone(),
                "-ql".to_string(),
                query_pack_path.clone(),
            ];
            push_parallelism(&mut args, *parallel, *cache, *max_parallel, *threads);
            args
        }

        ValidatedOperation::RunGeneric { raw_args } => raw_args.clone(),
    }
}

fn push_value(args: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

/// Shared tail for the database operations.
///
/// `parallel = true` emits `-goroutine`; `cache = false` emits
/// `-clean-cache` (the tool's cache is on unless the caller disables it).
fn push_parallelism(
    args: &mut Vec<String>,
    parallel: bool,
    cache: bool,
    max_parallel: Option<u64>,
    threads: Option<u64>,
) {
    if parallel {
        args.push("-goroutine".to_string());
    }
    if let Some(n) = max_parallel {
        args.push("-max-goroutines".to_string());
        args.push(n.to_string());
    }
    if let Some(n) = threads {
        args.push("-threads".to_string());
        args.push(n.to_string());
    }
    if !cache {
        args.push("-clean-cache".to_string());
    }
}
