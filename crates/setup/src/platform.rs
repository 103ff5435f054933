use anyhow::{bail, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Client configuration file written by the installer
pub const CLIENT_CONFIG_FILE: &str = "claude_desktop_config.json";

/// Operating system family, as far as installation paths are concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Unknown,
}

impl Platform {
    /// Detect from `OSTYPE` (set by bash and friends), falling back to the
    /// OS this binary was built for
    pub fn detect(ostype: Option<&str>) -> Self {
        ostype
            .map(Self::from_ostype)
            .filter(|p| *p != Platform::Unknown)
            .unwrap_or_else(|| Self::from_target_os(std::env::consts::OS))
    }

    pub fn from_ostype(ostype: &str) -> Self {
        let ostype = ostype.to_ascii_lowercase();
        if ostype.starts_with("linux") {
            Platform::Linux
        } else if ostype.starts_with("darwin") {
            Platform::MacOs
        } else if ostype.starts_with("msys") || ostype.starts_with("cygwin") || ostype == "win32" {
            Platform::Windows
        } else {
            Platform::Unknown
        }
    }

    fn from_target_os(os: &str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            _ => Platform::Unknown,
        }
    }

    /// Directory holding the client configuration file
    pub fn client_config_dir(&self, home: &Path, appdata: Option<&Path>) -> Result<PathBuf> {
        match self {
            Platform::MacOs => Ok(home.join("Library").join("Application Support").join("Claude")),
            Platform::Windows => match appdata {
                Some(appdata) => Ok(appdata.join("Claude")),
                None => bail!("APPDATA is not set; cannot locate the Claude configuration directory"),
            },
            Platform::Linux | Platform::Unknown => Ok(home.join(".config").join("Claude")),
        }
    }

    pub fn client_config_path(&self, home: &Path, appdata: Option<&Path>) -> Result<PathBuf> {
        Ok(self.client_config_dir(home, appdata)?.join(CLIENT_CONFIG_FILE))
    }

    /// How to install the missing analysis tools on this platform
    pub fn install_hint(&self) -> &'static str {
        match self {
            Platform::Linux => {
                "sudo apt-get install binutils file   (Fedora: sudo dnf install binutils file)"
            }
            Platform::MacOs => "brew install binutils   (then add $(brew --prefix binutils)/bin to PATH)",
            Platform::Windows => "install MSYS2, then run: pacman -S binutils file",
            Platform::Unknown => "install the binutils and file packages with your package manager",
        }
    }

    pub fn checksec_hint(&self) -> &'static str {
        match self {
            Platform::Linux => "sudo apt-get install checksec",
            Platform::MacOs => "brew install checksec",
            Platform::Windows | Platform::Unknown => {
                "see https://github.com/slimm609/checksec.sh for installation"
            }
        }
    }

    /// Program that launches the server from the client configuration
    pub fn launcher(&self) -> &'static str {
        match self {
            Platform::Windows => "powershell",
            _ => "env",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "Linux"),
            Platform::MacOs => write!(f, "macOS"),
            Platform::Windows => write!(f, "Windows"),
            Platform::Unknown => write!(f, "Unknown"),
        }
    }
}
