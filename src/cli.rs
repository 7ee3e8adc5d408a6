// src/cli.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MCP bridge for the codeql-n1ght security-analysis CLI.
///
/// `qlbridge.yaml` is optional; built-in defaults cover the standard
/// installation. CLI flags only select the config file and mode.
#[derive(Parser, Debug)]
#[command(name = "qlbridge", version, disable_help_subcommand = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// All supported CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the bridge over MCP stdio.
    ///
    /// This is the mode MCP clients launch. Stdout carries protocol
    /// frames; all logging goes to stderr.
    Serve {
        /// Path to config file (YAML)
        ///
        /// Defaults to ./qlbridge.yaml; a missing file means built-in
        /// defaults.
        #[arg(short, long, default_value = "qlbridge.yaml")]
        config: PathBuf,
    },

    /// Dispatch one operation locally and print the uniform response.
    ///
    /// Debugging aid: exercises exactly the validation/execution path the
    /// MCP tools use, without a protocol client.
    ///
    /// Example:
    /// qlbridge call create_database '{"target_path":"app.jar"}'
    Call {
        /// Path to config file (YAML)
        #[arg(short, long, default_value = "qlbridge.yaml")]
        config: PathBuf,

        /// Operation name
        ///
        /// One of: version | install_environment | create_database |
        /// scan_database | run_generic
        operation: String,

        /// Parameters as a JSON object
        ///
        /// Example:
        /// '{"target_path":"app.jar","decompiler":"procyon"}'
        #[arg(default_value = "{}")]
        params: String,
    },
}
