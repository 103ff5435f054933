use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the home directory where the server keeps its files
pub const WORKSPACE_DIR_NAME: &str = ".ghidra_mcp_workspace";

/// Environment variable that points at the server configuration file
pub const CONFIG_ENV_VAR: &str = "GHIDRA_MCP_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// Explicit Ghidra location, checked before the well-known paths
    #[serde(default)]
    pub ghidra_install_dir: Option<PathBuf>,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default)]
    pub strings: StringsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringsConfig {
    /// Minimum string length when the caller does not pass one
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Lines shown before the listing is truncated
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

/// `~/.ghidra_mcp_workspace`, or a relative fallback when there is no home directory
pub fn default_workspace_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(WORKSPACE_DIR_NAME)
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_min_length() -> usize {
    4
}

fn default_max_lines() -> usize {
    100
}

impl Default for StringsConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_lines: default_max_lines(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
            ghidra_install_dir: None,
            command_timeout_secs: default_command_timeout_secs(),
            strings: StringsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `config_path` if it exists, otherwise use defaults
    pub fn load(config_path: &Path) -> Result<Self> {
        let config: Self = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            tracing::info!("Configuration file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Config file location: explicit override, else `<workspace>/config.toml`
    pub fn resolve_path(env_override: Option<PathBuf>) -> PathBuf {
        env_override.unwrap_or_else(|| default_workspace_dir().join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.strings.min_length >= 1,
            "strings.min_length must be at least 1"
        );
        ensure!(
            self.strings.max_lines >= 1,
            "strings.max_lines must be at least 1"
        );
        ensure!(
            self.command_timeout_secs >= 1,
            "command_timeout_secs must be at least 1"
        );
        Ok(())
    }

    /// Create the workspace directory if it doesn't exist
    pub fn ensure_workspace(&self) -> Result<()> {
        std::fs::create_dir_all(&self.workspace_dir).with_context(|| {
            format!(
                "Failed to create workspace directory {}",
                self.workspace_dir.display()
            )
        })
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}
