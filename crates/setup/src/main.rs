use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod client_config;
mod deps;
mod installer;
mod platform;
mod prompt;

use installer::{default_server_path, Environment, InstallOutcome, Installer};
use prompt::TerminalPrompter;

#[derive(Parser, Debug)]
#[command(name = "ghidra-mcp-setup")]
#[command(about = "Check binary analysis tools and register the Ghidra MCP server with Claude Desktop", long_about = None)]
struct Args {
    /// Server executable to register (default: ghidra-mcp next to this program)
    #[arg(long)]
    server_path: Option<PathBuf>,

    /// Client configuration file to write (default: the platform's Claude Desktop config)
    #[arg(long)]
    config_path: Option<PathBuf>,
}

fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let server_path = match args.server_path {
        Some(path) => path,
        None => default_server_path()?,
    };

    let mut installer = Installer::new(Environment::from_process()?, server_path);
    if let Some(config_path) = args.config_path {
        installer = installer.with_config_path(config_path);
    }
    tracing::info!("Installing for {}", installer.platform());

    let mut stdout = std::io::stdout();
    match installer.run(&mut TerminalPrompter, &mut stdout)? {
        InstallOutcome::Completed {
            missing_tools,
            config_path,
            config,
        } => {
            tracing::info!(
                "Setup finished: {} missing tool(s), {} {:?}",
                missing_tools,
                config_path.display(),
                config
            );
            Ok(ExitCode::SUCCESS)
        }
        InstallOutcome::Aborted { missing_tools } => {
            tracing::warn!("Setup aborted with {} missing tool(s)", missing_tools);
            Ok(ExitCode::FAILURE)
        }
    }
}
