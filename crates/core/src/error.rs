//! Error types for binary analysis.

use std::path::PathBuf;
use std::time::Duration;

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors that can occur while analyzing a binary.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The target file does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An external program is not installed or not on PATH.
    #[error("'{program}' command not found. Install {package} package.")]
    CommandMissing {
        program: String,
        package: &'static str,
    },

    /// An external program exited unsuccessfully.
    #[error("'{program}' exited with {status}: {output}")]
    CommandFailed {
        program: String,
        status: String,
        output: String,
    },

    /// An external program exceeded the configured timeout.
    #[error("'{program}' timed out after {}s", .timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    /// A tool argument is out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Local I/O failure (stat, read, spawn).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Build a `CommandMissing` error with the package that provides `program`.
    pub fn command_missing(program: &str) -> Self {
        Self::CommandMissing {
            program: program.to_string(),
            package: package_for(program),
        }
    }

    /// Whether the error means a program could not be run at all.
    pub fn is_command_missing(&self) -> bool {
        matches!(self, Self::CommandMissing { .. })
    }
}

/// Package that provides a given analysis program.
pub fn package_for(program: &str) -> &'static str {
    match program {
        "strings" | "readelf" | "nm" | "objdump" => "binutils",
        "file" => "file",
        "checksec" => "checksec",
        _ => "the required",
    }
}
