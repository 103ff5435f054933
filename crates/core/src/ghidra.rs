// Ghidra installation discovery

use crate::config::ServerConfig;
use std::path::{Path, PathBuf};

/// Environment variable Ghidra's own launchers honour
pub const GHIDRA_ENV_VAR: &str = "GHIDRA_INSTALL_DIR";

const WELL_KNOWN_PATHS: &[&str] = &["/opt/ghidra", "/usr/local/ghidra"];

/// A located Ghidra installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhidraInstall {
    pub root: PathBuf,
    /// `support/analyzeHeadless`, when the installation ships it
    pub headless: Option<PathBuf>,
}

impl GhidraInstall {
    fn at(root: PathBuf) -> Self {
        let script = if cfg!(windows) {
            "analyzeHeadless.bat"
        } else {
            "analyzeHeadless"
        };
        let headless = Some(root.join("support").join(script)).filter(|p| p.is_file());
        Self { root, headless }
    }

    /// Locate Ghidra using the config override, `GHIDRA_INSTALL_DIR` and the
    /// well-known install locations, in that order
    pub fn find(config: &ServerConfig) -> Option<Self> {
        let env_dir = std::env::var_os(GHIDRA_ENV_VAR).map(PathBuf::from);
        let home = dirs::home_dir();
        let candidates = candidate_paths(
            config.ghidra_install_dir.as_deref(),
            env_dir,
            home.as_deref(),
        );
        Self::locate(&candidates)
    }

    /// First candidate that exists on disk
    pub fn locate(candidates: &[PathBuf]) -> Option<Self> {
        candidates
            .iter()
            .find(|path| path.exists())
            .map(|path| Self::at(path.clone()))
    }
}

/// Search order for a Ghidra installation
pub fn candidate_paths(
    configured: Option<&Path>,
    env_dir: Option<PathBuf>,
    home: Option<&Path>,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = configured {
        paths.push(dir.to_path_buf());
    }
    if let Some(dir) = env_dir.filter(|d| !d.as_os_str().is_empty()) {
        paths.push(dir);
    }
    paths.extend(WELL_KNOWN_PATHS.iter().map(PathBuf::from));
    if let Some(home) = home {
        paths.push(home.join("ghidra"));
    }
    paths
}
