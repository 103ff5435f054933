// Client configuration file (claude_desktop_config.json)

use crate::prompt::Prompter;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key of this server under `mcpServers`
pub const SERVER_NAME: &str = "ghidra-mcp";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "mcpServers")]
    pub mcp_servers: BTreeMap<String, ServerEntry>,
}

/// How the client launches one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub command: String,
    pub args: Vec<String>,
}

impl ClientConfig {
    /// Config with a single entry: `launcher <server_path>`
    pub fn for_server(launcher: &str, server_path: &Path) -> Result<Self> {
        let server_path = server_path
            .to_str()
            .with_context(|| format!("Server path is not valid UTF-8: {}", server_path.display()))?;

        let mut mcp_servers = BTreeMap::new();
        mcp_servers.insert(
            SERVER_NAME.to_string(),
            ServerEntry {
                command: launcher.to_string(),
                args: vec![server_path.to_string()],
            },
        );
        Ok(Self { mcp_servers })
    }

    pub fn to_json(&self) -> Result<String> {
        let mut json =
            serde_json::to_string_pretty(self).context("Failed to serialize client config")?;
        json.push('\n');
        Ok(json)
    }
}

/// What happened to the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Replaced { backup: PathBuf },
    /// The user chose to keep the existing file
    Kept,
}

/// `<file>.backup` next to the original
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".backup");
    PathBuf::from(name)
}

/// Write `config` to `path`, asking before replacing an existing file.
///
/// Declining leaves the existing file untouched and creates no backup.
pub fn write_client_config(
    path: &Path,
    config: &ClientConfig,
    prompter: &mut dyn Prompter,
) -> Result<WriteOutcome> {
    let json = config.to_json()?;

    if path.exists() {
        let question = format!("{} already exists. Overwrite it?", path.display());
        if !prompter.confirm(&question)? {
            tracing::info!("Keeping existing {}", path.display());
            return Ok(WriteOutcome::Kept);
        }

        let backup = backup_path(path);
        std::fs::copy(path, &backup)
            .with_context(|| format!("Failed to back up {} to {}", path.display(), backup.display()))?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        return Ok(WriteOutcome::Replaced { backup });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(WriteOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::test_support::ScriptedPrompter;
    use tempfile::TempDir;

    const EXISTING: &str = "{\"mcpServers\": {\"other\": {\"command\": \"node\", \"args\": []}}}\n";

    fn sample_config() -> ClientConfig {
        ClientConfig::for_server("env", Path::new("/opt/ghidra-mcp/bin/ghidra-mcp")).unwrap()
    }

    #[test]
    fn test_json_shape() {
        let json = sample_config().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mcpServers"]["ghidra-mcp"]["command"], "env");
        assert_eq!(
            value["mcpServers"]["ghidra-mcp"]["args"][0],
            "/opt/ghidra-mcp/bin/ghidra-mcp"
        );
        assert_eq!(value["mcpServers"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/cfg/claude_desktop_config.json")),
            PathBuf::from("/cfg/claude_desktop_config.json.backup")
        );
    }

    #[test]
    fn test_creates_missing_file_and_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Claude").join("claude_desktop_config.json");
        let mut prompter = ScriptedPrompter::default();

        let outcome = write_client_config(&path, &sample_config(), &mut prompter).unwrap();

        assert_eq!(outcome, WriteOutcome::Created);
        assert!(prompter.questions.is_empty());
        let written: ClientConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample_config());
    }

    #[test]
    fn test_declining_overwrite_keeps_file_and_skips_backup() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("claude_desktop_config.json");
        std::fs::write(&path, EXISTING).unwrap();
        let mut prompter = ScriptedPrompter::answering(&[false]);

        let outcome = write_client_config(&path, &sample_config(), &mut prompter).unwrap();

        assert_eq!(outcome, WriteOutcome::Kept);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), EXISTING);
        assert!(!backup_path(&path).exists());
        assert_eq!(prompter.questions.len(), 1);
    }

    #[test]
    fn test_accepting_overwrite_backs_up_original() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("claude_desktop_config.json");
        std::fs::write(&path, EXISTING).unwrap();
        let mut prompter = ScriptedPrompter::answering(&[true]);

        let outcome = write_client_config(&path, &sample_config(), &mut prompter).unwrap();

        let backup = backup_path(&path);
        assert_eq!(outcome, WriteOutcome::Replaced { backup: backup.clone() });
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), EXISTING);
        let written: ClientConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, sample_config());
    }
}
