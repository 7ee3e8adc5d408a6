// src/server.rs

//! MCP transport adapter.
//!
//! One `#[tool]` per supported operation, each with a typed, schema-derived
//! argument struct. Tool handlers convert their arguments into the raw
//! parameter mapping the dispatcher validates, so the transport stays a thin
//! shell around `Dispatcher::dispatch`. Results come back as structured
//! content in the uniform four-field shape.
//!
//! The server speaks stdio; nothing here may write to stdout except the
//! protocol itself (logs go to stderr, see `main.rs`).

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::validate::OperationKind;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, ErrorData, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::transport::stdio;
use rmcp::{schemars, tool, tool_handler, tool_router, ServerHandler, ServiceExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/* ---------------- tool argument schemas ---------------- */

// Optional on every operation: exe_path / cwd / timeout_seconds. Fields set
// to None are skipped during serialization so the validator sees them as
// absent rather than null.

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct VersionArgs {
    /// Override the configured executable path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<String>,
    /// Working directory for the child process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Override the operation deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct InstallEnvironmentArgs {
    /// JDK download URL passed to the installer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jdk_url: Option<String>,
    /// Ant download URL passed to the installer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ant_url: Option<String>,
    /// CodeQL bundle download URL passed to the installer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codeql_url: Option<String>,
    /// Override the configured executable path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<String>,
    /// Working directory for the child process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Override the operation deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CreateDatabaseArgs {
    /// JAR/WAR/ZIP artifact to build a CodeQL database from.
    pub target_path: String,
    /// Decompiler to use: procyon or fernflower.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decompiler: Option<String>,
    /// Dependency handling: none or all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_mode: Option<String>,
    /// Extra source directory included in the database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    /// Enable parallel extraction (default false).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    /// Keep the tool's cache (default true); false clears it first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    /// Upper bound on parallel workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<u64>,
    /// Extractor thread count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u64>,
    /// Override the configured executable path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<String>,
    /// Working directory for the child process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Override the operation deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ScanDatabaseArgs {
    /// CodeQL database directory to scan.
    pub database_path: String,
    /// Query pack directory or file to run.
    pub query_pack_path: String,
    /// Enable parallel scanning (default false).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    /// Keep the tool's cache (default true); false clears it first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
    /// Upper bound on parallel workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<u64>,
    /// Scanner thread count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<u64>,
    /// Override the configured executable path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<String>,
    /// Working directory for the child process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Override the operation deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RunGenericArgs {
    /// Raw argument tokens passed to the executable verbatim, in order.
    pub raw_args: Vec<String>,
    /// Override the configured executable path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<String>,
    /// Working directory for the child process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Override the operation deadline in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

/* ---------------- server ---------------- */

#[derive(Clone)]
pub struct QlBridgeServer {
    dispatcher: Arc<Dispatcher>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl QlBridgeServer {
    pub fn new(config: Config) -> Self {
        Self {
            dispatcher: Arc::new(Dispatcher::new(config)),
            tool_router: Self::tool_router(),
        }
    }

    async fn relay(
        &self,
        kind: OperationKind,
        args: impl Serialize,
    ) -> Result<CallToolResult, ErrorData> {
        let raw = match serde_json::to_value(args)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?
        {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };

        let response = self.dispatcher.dispatch(kind, raw).await;

        let structured = serde_json::to_value(&response)
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::structured(structured))
    }

    #[tool(
        description = "Report the codeql-n1ght executable version (runs `--version`). Returns {returncode, stdout, stderr, timeout}."
    )]
    async fn version(
        &self,
        params: Parameters<VersionArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.relay(OperationKind::Version, params.0).await
    }

    #[tool(
        description = "Install the analysis environment (JDK, Ant, CodeQL bundle). Optional download URLs override the tool's defaults. Long-running."
    )]
    async fn install_environment(
        &self,
        params: Parameters<InstallEnvironmentArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.relay(OperationKind::InstallEnvironment, params.0).await
    }

    #[tool(
        description = "Create a CodeQL database from a JAR/WAR/ZIP artifact. decompiler must be procyon or fernflower; dependency_mode must be none or all. Very long-running on large artifacts."
    )]
    async fn create_database(
        &self,
        params: Parameters<CreateDatabaseArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.relay(OperationKind::CreateDatabase, params.0).await
    }

    #[tool(
        description = "Run a security scan: execute a query pack against an existing CodeQL database. Very long-running on large databases."
    )]
    async fn scan_database(
        &self,
        params: Parameters<ScanDatabaseArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.relay(OperationKind::ScanDatabase, params.0).await
    }

    #[tool(
        description = "Escape hatch: run codeql-n1ght with a raw argument list, passed through verbatim with no validation or implicit flags."
    )]
    async fn run_generic(
        &self,
        params: Parameters<RunGenericArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.relay(OperationKind::RunGeneric, params.0).await
    }
}

#[tool_handler]
impl ServerHandler for QlBridgeServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            protocol_version: ProtocolVersion::LATEST,
            server_info: Implementation {
                name: "qlbridge".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Bridge to the codeql-n1ght security-analysis CLI. Typical flow: \
                 install_environment once, create_database on a JAR/WAR/ZIP, then \
                 scan_database with a query pack. Every tool returns \
                 {returncode, stdout, stderr, timeout}; returncode is null only on \
                 timeout or when the call failed before the process started (the \
                 reason is in stderr). A non-zero returncode is the tool's own \
                 exit status, not a transport error."
                    .to_string(),
            ),
        }
    }
}

/// Serve the bridge over stdio until the client disconnects.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(executable = %config.executable, "qlbridge MCP server starting on stdio");

    let service = QlBridgeServer::new(config)
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("server error: {}", e))?;

    service.waiting().await?;

    tracing::info!("qlbridge MCP server shutting down");
    Ok(())
}
