// src/main.rs

//! qlbridge
//!
//! Entry point for the qlbridge binary.
//!
//! This binary exposes the codeql-n1ght security-analysis CLI to AI
//! assistants over MCP stdio. It delegates all real work to the dispatch
//! and server modules.
//!
//! Responsibilities of this file:
//! - Load `.env` and parse CLI arguments
//! - Initialise tracing to stderr (stdout is reserved for protocol frames)
//! - Hand off to serve or one-shot dispatch
//!
//! There is intentionally *no business logic* here.

mod args;
mod cli;
mod config;
mod dispatch;
mod error;
mod execution_id;
mod kill;
mod paths;
mod runner;
mod server;
mod validate;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Never log to stdout: in serve mode it carries MCP protocol frames.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        cli::Command::Serve { config } => {
            let cfg = config::Config::load_or_default(&config)?;
            server::serve(cfg).await
        }

        cli::Command::Call { config, operation, params } => {
            let cfg = config::Config::load_or_default(&config)?;
            let kind: validate::OperationKind = operation.parse()?;
            let raw: validate::RawParams =
                serde_json::from_str(&params).context("Parameters must be a JSON object")?;

            let dispatcher = dispatch::Dispatcher::new(cfg);
            let response = dispatcher.dispatch(kind, raw).await;

            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}
