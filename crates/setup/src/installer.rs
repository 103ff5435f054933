// Installation steps, run in order; any I/O failure aborts the run

use crate::client_config::{write_client_config, ClientConfig, WriteOutcome, SERVER_NAME};
use crate::deps::DependencyReport;
use crate::platform::Platform;
use crate::prompt::Prompter;
use anyhow::{bail, Context, Result};
use ghidra_mcp_core::config::WORKSPACE_DIR_NAME;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Process environment the installer depends on
#[derive(Debug, Clone)]
pub struct Environment {
    pub ostype: Option<String>,
    pub appdata: Option<PathBuf>,
    pub path_var: Option<OsString>,
    pub home: PathBuf,
}

impl Environment {
    pub fn from_process() -> Result<Self> {
        Ok(Self {
            ostype: std::env::var("OSTYPE").ok(),
            appdata: std::env::var_os("APPDATA").map(PathBuf::from),
            path_var: std::env::var_os("PATH"),
            home: dirs::home_dir().context("Could not determine the home directory")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Completed {
        missing_tools: usize,
        config_path: PathBuf,
        config: WriteOutcome,
    },
    /// The user stopped after being told about missing tools
    Aborted { missing_tools: usize },
}

pub struct Installer {
    platform: Platform,
    env: Environment,
    server_path: PathBuf,
    config_path: Option<PathBuf>,
}

impl Installer {
    pub fn new(env: Environment, server_path: PathBuf) -> Self {
        Self {
            platform: Platform::detect(env.ostype.as_deref()),
            env,
            server_path,
            config_path: None,
        }
    }

    /// Write the client configuration somewhere other than the platform default
    pub fn with_config_path(mut self, config_path: PathBuf) -> Self {
        self.config_path = Some(config_path);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.env.home.join(WORKSPACE_DIR_NAME)
    }

    pub fn run(&self, prompter: &mut dyn Prompter, out: &mut dyn Write) -> Result<InstallOutcome> {
        writeln!(out, "=== Ghidra MCP Setup ===")?;
        writeln!(out, "Detected OS: {}", self.platform)?;

        writeln!(out, "\nChecking server binary...")?;
        let server_path = check_server(&self.server_path)?;
        writeln!(out, "  ✓ {}", server_path.display())?;

        writeln!(out, "\nChecking analysis tools...")?;
        let report = DependencyReport::scan(self.env.path_var.as_deref());
        for tool in &report.tools {
            match (&tool.location, tool.required) {
                (Some(location), _) => writeln!(out, "  ✓ {} ({})", tool.name, location.display())?,
                (None, true) => writeln!(out, "  ✗ {} (missing)", tool.name)?,
                (None, false) => writeln!(out, "  - {} (optional, not found)", tool.name)?,
            }
        }

        if !report.missing_optional().is_empty() {
            writeln!(
                out,
                "\nOptional tools improve check_security results: {}",
                self.platform.checksec_hint()
            )?;
        }

        let missing_tools = report.missing_required();
        if missing_tools > 0 {
            tracing::warn!("{} required tool(s) missing", missing_tools);
            writeln!(
                out,
                "\nWarning: {} required tool(s) missing. Install them with:\n  {}",
                missing_tools,
                self.platform.install_hint()
            )?;
            if !prompter.confirm("Continue anyway?")? {
                writeln!(out, "Setup cancelled.")?;
                return Ok(InstallOutcome::Aborted { missing_tools });
            }
        }

        let workspace = self.workspace_dir();
        std::fs::create_dir_all(&workspace)
            .with_context(|| format!("Failed to create workspace {}", workspace.display()))?;
        writeln!(out, "\nWorkspace: {}", workspace.display())?;

        let config_path = match &self.config_path {
            Some(path) => path.clone(),
            None => self
                .platform
                .client_config_path(&self.env.home, self.env.appdata.as_deref())?,
        };
        let config = ClientConfig::for_server(self.platform.launcher(), &server_path)?;
        let outcome = write_client_config(&config_path, &config, prompter)?;

        match &outcome {
            WriteOutcome::Created => writeln!(out, "Wrote {}", config_path.display())?,
            WriteOutcome::Replaced { backup } => writeln!(
                out,
                "Wrote {} (previous version saved as {})",
                config_path.display(),
                backup.display()
            )?,
            WriteOutcome::Kept => writeln!(
                out,
                "Kept existing {}. Add the \"{}\" entry yourself:\n{}",
                config_path.display(),
                SERVER_NAME,
                config.to_json()?
            )?,
        }

        writeln!(out, "\nNext steps:")?;
        writeln!(out, "  1. Restart Claude Desktop")?;
        writeln!(out, "  2. Ask Claude to analyze a binary, e.g. \"Analyze /bin/ls\"")?;

        Ok(InstallOutcome::Completed {
            missing_tools,
            config_path,
            config: outcome,
        })
    }
}

/// Absolute path of the server executable; fails when it is absent
fn check_server(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        bail!(
            "Server binary not found at {}. Build it with `cargo build --release -p ghidra-mcp`",
            path.display()
        );
    }
    std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))
}

/// The `ghidra-mcp` binary installed next to this one
pub fn default_server_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the setup executable")?;
    Ok(exe.with_file_name(format!("ghidra-mcp{}", std::env::consts::EXE_SUFFIX)))
}
