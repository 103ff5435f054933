// External command execution for the analysis tools

use crate::error::{AnalysisError, AnalysisResult};
use std::ffi::OsStr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Default bound on a single external command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_string(),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run that printed `stderr`
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            status: format!("exit status: {}", code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, the way a terminal would show both streams
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        text.push_str(&self.stderr);
        text
    }

    /// Turn an unsuccessful exit into `AnalysisError::CommandFailed`
    pub fn checked(self, program: &str) -> AnalysisResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(AnalysisError::CommandFailed {
                program: program.to_string(),
                status: self.status.clone(),
                output: self.combined().trim().to_string(),
            })
        }
    }
}

/// Runs external programs on behalf of the analyzer
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and capture its output.
    ///
    /// A non-zero exit is reported through `CommandOutput::success`, not as an
    /// error. Errors are reserved for programs that could not run at all.
    async fn run(&self, program: &str, args: &[&OsStr]) -> AnalysisResult<CommandOutput>;
}

/// Runner backed by real child processes
#[derive(Debug, Clone)]
pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait::async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[&OsStr]) -> AnalysisResult<CommandOutput> {
        tracing::debug!("Running {} {:?}", program, args);

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{} is not installed or not on PATH", program);
                return Err(AnalysisError::command_missing(program));
            }
            Ok(Err(e)) => return Err(AnalysisError::Io(e)),
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", program, self.timeout);
                return Err(AnalysisError::Timeout {
                    program: program.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_command_missing() {
        let runner = SystemRunner::default();
        let err = runner
            .run("ghidra-mcp-no-such-program", &[])
            .await
            .unwrap_err();
        assert!(err.is_command_missing());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_and_status() {
        let runner = SystemRunner::default();
        let out = runner
            .run("sh", &[OsStr::new("-c"), OsStr::new("echo hello; exit 3")])
            .await
            .unwrap();

        assert!(!out.success);
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.checked("sh").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_slow_command() {
        let runner = SystemRunner::new(Duration::from_millis(100));
        let err = runner
            .run("sh", &[OsStr::new("-c"), OsStr::new("sleep 5")])
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout { .. }));
    }

    #[test]
    fn test_combined_appends_stderr() {
        let out = CommandOutput {
            success: true,
            status: "exit status: 0".to_string(),
            stdout: "out\n".to_string(),
            stderr: "err\n".to_string(),
        };
        assert_eq!(out.combined(), "out\nerr\n");
    }
}
