// Presence checks for the external analysis tools

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Tools every analysis operation depends on
pub const REQUIRED_TOOLS: &[&str] = &["file", "strings", "readelf", "nm"];

/// Tools that improve results when present
pub const OPTIONAL_TOOLS: &[&str] = &["checksec"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: &'static str,
    pub required: bool,
    pub location: Option<PathBuf>,
}

impl ToolStatus {
    pub fn is_present(&self) -> bool {
        self.location.is_some()
    }
}

/// Result of looking up every tool on PATH
#[derive(Debug, Clone)]
pub struct DependencyReport {
    pub tools: Vec<ToolStatus>,
}

impl DependencyReport {
    /// Look up all required and optional tools in `path_var`
    pub fn scan(path_var: Option<&OsStr>) -> Self {
        let lookup = |name: &'static str, required: bool| ToolStatus {
            name,
            required,
            location: path_var.and_then(|p| find_in_path(name, p)),
        };

        let tools = REQUIRED_TOOLS
            .iter()
            .map(|name| lookup(*name, true))
            .chain(OPTIONAL_TOOLS.iter().map(|name| lookup(*name, false)))
            .collect();

        Self { tools }
    }

    /// Number of required tools that were not found
    pub fn missing_required(&self) -> usize {
        self.tools
            .iter()
            .filter(|t| t.required && !t.is_present())
            .count()
    }

    pub fn missing_optional(&self) -> Vec<&'static str> {
        self.tools
            .iter()
            .filter(|t| !t.required && !t.is_present())
            .map(|t| t.name)
            .collect()
    }
}

/// First executable named `program` in the directories of `path_var`
pub fn find_in_path(program: &str, path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| executable_names(program).map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn executable_names(program: &str) -> impl Iterator<Item = String> + '_ {
    [".exe", ".bat", ".cmd", ""]
        .into_iter()
        .map(move |ext| format!("{}{}", program, ext))
}

#[cfg(not(windows))]
fn executable_names(program: &str) -> impl Iterator<Item = String> {
    std::iter::once(program.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// Create an executable stub named `name` in `dir`
    pub fn fake_tool(dir: &Path, name: &str) {
        let file_name = if cfg!(windows) {
            format!("{}.exe", name)
        } else {
            name.to_string()
        };
        let path = dir.join(file_name);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }
}
