// Standalone MCP server binary

use anyhow::Result;
use ghidra_mcp::server::McpServer;
use ghidra_mcp::tools::binary_analysis_registry;
use ghidra_mcp_core::config::CONFIG_ENV_VAR;
use ghidra_mcp_core::{BinaryAnalyzer, GhidraInstall, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (stdout carries the protocol)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Ghidra MCP Server starting...");

    let config_path = ServerConfig::resolve_path(std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
    let config = ServerConfig::load(&config_path)?;
    config.ensure_workspace()?;
    tracing::info!("Workspace: {}", config.workspace_dir.display());

    let ghidra = GhidraInstall::find(&config);
    match &ghidra {
        Some(install) => tracing::info!("Found Ghidra at {}", install.root.display()),
        None => tracing::info!("Ghidra not found, using command-line tools only"),
    }

    let analyzer = Arc::new(BinaryAnalyzer::from_config(&config));
    let registry = binary_analysis_registry(analyzer);
    tracing::info!("Registered {} tools", registry.list_schemas().len());

    let server = McpServer::new(registry).with_instructions(instructions(ghidra.as_ref()));
    server.start().await?;

    Ok(())
}

fn instructions(ghidra: Option<&GhidraInstall>) -> String {
    let mut text = String::from(
        "Binary analysis tools backed by file, strings, readelf, nm and (when installed) checksec. \
         Every tool takes an absolute file_path.",
    );
    match ghidra {
        Some(install) => {
            text.push_str(&format!(" Ghidra installation: {}", install.root.display()));
            if install.headless.is_none() {
                text.push_str(" (analyzeHeadless not found)");
            }
        }
        None => text.push_str(" Ghidra is not installed on this host."),
    }
    text
}
