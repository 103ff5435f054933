// Binary analysis built on the standard command-line tools
//
// Each operation checks that the target exists, runs one or more external
// programs through a `CommandRunner`, and formats their output as plain text.

use crate::config::{ServerConfig, StringsConfig};
use crate::error::{AnalysisError, AnalysisResult};
use crate::runner::{CommandRunner, SystemRunner};
use crate::security::{canary_enabled, nx_enabled, pie_enabled, relro_level, SecurityReport};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

const SECURITY_TOOLS_NOTE: &str =
    "\nNote: Install 'checksec' or 'readelf' for detailed security analysis";

/// Runs the analysis operations exposed as MCP tools
pub struct BinaryAnalyzer {
    runner: Arc<dyn CommandRunner>,
    strings: StringsConfig,
}

impl BinaryAnalyzer {
    pub fn new(runner: Arc<dyn CommandRunner>, strings: StringsConfig) -> Self {
        Self { runner, strings }
    }

    /// Analyzer that runs real processes with the configured timeout
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            Arc::new(SystemRunner::new(config.command_timeout())),
            config.strings.clone(),
        )
    }

    pub fn default_min_length(&self) -> usize {
        self.strings.min_length
    }

    /// Size, permissions, fingerprint, `file` type and the ELF header when present
    pub async fn analyze_binary(&self, path: &Path) -> AnalysisResult<String> {
        let metadata = require_file(path).await?;

        let mut results = Vec::new();
        results.push(format!("=== Binary Analysis: {} ===\n", display_name(path)));

        let size = metadata.len();
        results.push(format!(
            "File Size: {} bytes ({:.2} KB)",
            group_thousands(size),
            size as f64 / 1024.0
        ));
        results.push(format!("Permissions: {}", permissions(&metadata)));

        if let Ok(modified) = metadata.modified() {
            let modified: DateTime<Utc> = modified.into();
            results.push(format!("Modified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC")));
        }

        if metadata.is_file() {
            match sha256_file(path).await {
                Ok(digest) => results.push(format!("SHA-256: {}", digest)),
                Err(e) => tracing::warn!("Failed to hash {}: {}", path.display(), e),
            }
        }

        let file_type = self
            .runner
            .run("file", &[path.as_os_str()])
            .await
            .and_then(|out| out.checked("file"));

        let is_elf = match file_type {
            Ok(out) => {
                let text = out.combined();
                results.push(format!("\nFile Type:\n{}", text.trim()));
                describes_elf(&text)
            }
            Err(e) => {
                results.push(format!("Could not determine file type: {}", e));
                false
            }
        };

        if is_elf {
            let header = self
                .runner
                .run("readelf", &[OsStr::new("-h"), path.as_os_str()])
                .await
                .and_then(|out| out.checked("readelf"));
            match header {
                Ok(out) => results.push(format!("\nELF Header:\n{}", out.stdout.trim_end())),
                Err(e) => {
                    tracing::debug!("readelf -h failed: {}", e);
                    results.push("\n(readelf not available for detailed ELF analysis)".to_string());
                }
            }
        }

        Ok(results.join("\n"))
    }

    /// Printable strings of at least `min_length` characters
    pub async fn extract_strings(
        &self,
        path: &Path,
        min_length: Option<usize>,
    ) -> AnalysisResult<String> {
        let min_length = min_length.unwrap_or(self.strings.min_length);
        if min_length == 0 {
            return Err(AnalysisError::InvalidArgument(
                "min_length must be at least 1".to_string(),
            ));
        }

        require_file(path).await?;

        let min_length = min_length.to_string();
        let out = self
            .runner
            .run(
                "strings",
                &[OsStr::new("-n"), OsStr::new(&min_length), path.as_os_str()],
            )
            .await?
            .checked("strings")?;

        let trimmed = out.stdout.trim();
        let lines: Vec<&str> = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('\n').collect()
        };

        Ok(format_strings_listing(&lines, self.strings.max_lines))
    }

    /// One-line description from `file -b`
    pub async fn get_file_info(&self, path: &Path) -> AnalysisResult<String> {
        require_file(path).await?;

        let out = self
            .runner
            .run("file", &[OsStr::new("-b"), path.as_os_str()])
            .await?
            .checked("file")?;

        Ok(format!("File Info: {}", out.combined().trim()))
    }

    /// Exploit mitigations, from checksec when installed, otherwise from readelf and nm
    pub async fn check_security(&self, path: &Path) -> AnalysisResult<String> {
        require_file(path).await?;

        let mut results = Vec::new();
        results.push(format!("=== Security Features: {} ===\n", display_name(path)));

        let mut file_arg = OsString::from("--file=");
        file_arg.push(path.as_os_str());

        match self.runner.run("checksec", &[file_arg.as_os_str()]).await {
            Ok(out) if out.success => {
                results.push(out.combined());
                return Ok(results.join("\n"));
            }
            Ok(out) => tracing::warn!("checksec failed ({}), using manual checks", out.status),
            Err(e) if e.is_command_missing() => {
                tracing::debug!("checksec not installed, using manual checks")
            }
            Err(e) => tracing::warn!("checksec unusable ({}), using manual checks", e),
        }

        let mut report = SecurityReport::default();
        let checked = self.manual_security_checks(path, &mut report).await;
        results.extend(report.lines());
        if let Err(e) = checked {
            tracing::warn!("Manual security checks incomplete: {}", e);
            results.push(SECURITY_TOOLS_NOTE.to_string());
        }

        Ok(results.join("\n"))
    }

    /// Fills `report` one mitigation at a time, stopping at the first tool failure
    async fn manual_security_checks(
        &self,
        path: &Path,
        report: &mut SecurityReport,
    ) -> AnalysisResult<()> {
        let file = path.as_os_str();

        let program_headers = self.readelf("-lW", file).await?;
        report.nx = Some(nx_enabled(&program_headers));

        let elf_header = self.readelf("-h", file).await?;
        report.pie = Some(pie_enabled(&elf_header));

        let dynamic = self.readelf("-d", file).await?;
        report.relro = Some(relro_level(&program_headers, &dynamic));

        // stripped binaries keep the canary import in the dynamic symbol table
        let mut symbols = self.runner.run("nm", &[file]).await?.combined();
        if !canary_enabled(&symbols) {
            if let Ok(out) = self.runner.run("nm", &[OsStr::new("-D"), file]).await {
                symbols.push_str(&out.combined());
            }
        }
        report.stack_canary = Some(canary_enabled(&symbols));

        Ok(())
    }

    async fn readelf(&self, flag: &str, file: &OsStr) -> AnalysisResult<String> {
        Ok(self
            .runner
            .run("readelf", &[OsStr::new(flag), file])
            .await?
            .checked("readelf")?
            .stdout)
    }
}

async fn require_file(path: &Path) -> AnalysisResult<Metadata> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(metadata),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AnalysisError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => Err(AnalysisError::Io(e)),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Whether `file` output (with or without the `path:` prefix) names an ELF object
fn describes_elf(file_output: &str) -> bool {
    file_output
        .split_once(": ")
        .map(|(_, description)| description)
        .unwrap_or(file_output)
        .contains("ELF")
}

#[cfg(unix)]
fn permissions(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permissions(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "read-only".to_string()
    } else {
        "read-write".to_string()
    }
}

async fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Header plus at most `max_lines` strings, with a count of what was cut
pub fn format_strings_listing(lines: &[&str], max_lines: usize) -> String {
    if lines.len() > max_lines {
        format!(
            "=== Strings Extracted (showing first {} of {}) ===\n\n{}\n\n... and {} more strings",
            max_lines,
            lines.len(),
            lines[..max_lines].join("\n"),
            lines.len() - max_lines
        )
    } else {
        format!(
            "=== Strings Extracted ({} total) ===\n\n{}",
            lines.len(),
            lines.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutput;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    enum Scripted {
        Output(CommandOutput),
        Missing,
    }

    /// Runner that answers from a table keyed by program plus its flags
    #[derive(Default)]
    struct FakeRunner {
        responses: HashMap<String, Scripted>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn respond(mut self, key: &str, stdout: &str) -> Self {
            self.responses
                .insert(key.to_string(), Scripted::Output(CommandOutput::ok(stdout)));
            self
        }

        fn fail(mut self, key: &str) -> Self {
            self.responses.insert(
                key.to_string(),
                Scripted::Output(CommandOutput::failed(1, "not an ELF file")),
            );
            self
        }

        fn missing(mut self, key: &str) -> Self {
            self.responses.insert(key.to_string(), Scripted::Missing);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[&OsStr]) -> AnalysisResult<CommandOutput> {
            let args: Vec<String> = args
                .iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect();
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {}", program, args.join(" ")));

            let mut key = program.to_string();
            for arg in args.iter().filter(|a| a.starts_with('-') && !a.contains('=')) {
                key.push(' ');
                key.push_str(arg);
            }

            match self.responses.get(&key) {
                Some(Scripted::Output(out)) => Ok(out.clone()),
                Some(Scripted::Missing) | None => Err(AnalysisError::command_missing(program)),
            }
        }
    }

    fn analyzer(runner: FakeRunner) -> (BinaryAnalyzer, Arc<FakeRunner>) {
        let runner = Arc::new(runner);
        let analyzer = BinaryAnalyzer::new(runner.clone(), StringsConfig::default());
        (analyzer, runner)
    }

    fn sample_file(dir: &TempDir, contents: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join("sample.bin");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(16696), "16,696");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_describes_elf_ignores_path() {
        assert!(describes_elf("/bin/ls: ELF 64-bit LSB pie executable"));
        assert!(!describes_elf("/tmp/ELF-notes.txt: ASCII text"));
        assert!(describes_elf("ELF 32-bit LSB executable"));
    }

    #[test]
    fn test_strings_listing_truncates() {
        let owned: Vec<String> = (0..150).map(|i| format!("str{}", i)).collect();
        let lines: Vec<&str> = owned.iter().map(String::as_str).collect();

        let text = format_strings_listing(&lines, 100);
        assert!(text.starts_with("=== Strings Extracted (showing first 100 of 150) ===\n\n"));
        assert!(text.contains("str99\n"));
        assert!(!text.contains("str100\n"));
        assert!(text.ends_with("\n\n... and 50 more strings"));
    }

    #[test]
    fn test_strings_listing_short() {
        let text = format_strings_listing(&["GLIBC_2.34", "main"], 100);
        assert_eq!(text, "=== Strings Extracted (2 total) ===\n\nGLIBC_2.34\nmain");
    }

    #[tokio::test]
    async fn test_analyze_binary_elf() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, &[0x7f, b'E', b'L', b'F']);
        let (analyzer, runner) = analyzer(
            FakeRunner::default()
                .respond("file", &format!("{}: ELF 64-bit LSB executable\n", path.display()))
                .respond("readelf -h", "ELF Header:\n  Type: EXEC (Executable file)\n"),
        );

        let text = analyzer.analyze_binary(&path).await.unwrap();

        assert!(text.starts_with("=== Binary Analysis: sample.bin ===\n\n"));
        assert!(text.contains("File Size: 4 bytes (0.00 KB)"));
        assert!(text.contains("SHA-256: "));
        assert!(text.contains("\nFile Type:\n"));
        assert!(text.contains("ELF Header:\n  Type: EXEC"));
        assert_eq!(runner.calls().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_analyze_binary_reports_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"#!/bin/sh\n");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o750)).unwrap();
        let (analyzer, _) = analyzer(FakeRunner::default().respond("file", "script text"));

        let text = analyzer.analyze_binary(&path).await.unwrap();
        assert!(text.contains("Permissions: 750"));
    }

    #[tokio::test]
    async fn test_analyze_binary_non_elf_skips_readelf() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"plain text");
        let (analyzer, runner) =
            analyzer(FakeRunner::default().respond("file", "sample.bin: ASCII text\n"));

        let text = analyzer.analyze_binary(&path).await.unwrap();

        assert!(!text.contains("ELF Header"));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_analyze_binary_without_file_command() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"data");
        let (analyzer, _) = analyzer(FakeRunner::default().missing("file"));

        let text = analyzer.analyze_binary(&path).await.unwrap();
        assert!(text.contains("Could not determine file type: 'file' command not found."));
    }

    #[tokio::test]
    async fn test_analyze_binary_readelf_failure() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"\x7fELF");
        let (analyzer, _) = analyzer(
            FakeRunner::default()
                .respond("file", "sample.bin: ELF 64-bit LSB core file")
                .fail("readelf -h"),
        );

        let text = analyzer.analyze_binary(&path).await.unwrap();
        assert!(text.ends_with("\n(readelf not available for detailed ELF analysis)"));
    }

    #[tokio::test]
    async fn test_missing_file_for_every_operation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent");
        let (analyzer, runner) = analyzer(FakeRunner::default());

        assert!(matches!(
            analyzer.analyze_binary(&path).await,
            Err(AnalysisError::FileNotFound(_))
        ));
        assert!(matches!(
            analyzer.extract_strings(&path, None).await,
            Err(AnalysisError::FileNotFound(_))
        ));
        assert!(matches!(
            analyzer.get_file_info(&path).await,
            Err(AnalysisError::FileNotFound(_))
        ));
        assert!(matches!(
            analyzer.check_security(&path).await,
            Err(AnalysisError::FileNotFound(_))
        ));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_extract_strings_passes_min_length() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"hello world");
        let (analyzer, runner) =
            analyzer(FakeRunner::default().respond("strings -n", "hello world\n"));

        let text = analyzer.extract_strings(&path, Some(8)).await.unwrap();

        assert_eq!(text, "=== Strings Extracted (1 total) ===\n\nhello world");
        assert_eq!(
            runner.calls(),
            vec![format!("strings -n 8 {}", path.display())]
        );
    }

    #[tokio::test]
    async fn test_extract_strings_default_min_length() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"");
        let (analyzer, runner) = analyzer(FakeRunner::default().respond("strings -n", ""));

        let text = analyzer.extract_strings(&path, None).await.unwrap();

        assert_eq!(text, "=== Strings Extracted (0 total) ===\n\n");
        assert!(runner.calls()[0].starts_with("strings -n 4 "));
    }

    #[tokio::test]
    async fn test_extract_strings_rejects_zero() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, _) = analyzer(FakeRunner::default());

        assert!(matches!(
            analyzer.extract_strings(&path, Some(0)).await,
            Err(AnalysisError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_extract_strings_without_binutils() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, _) = analyzer(FakeRunner::default().missing("strings -n"));

        let err = analyzer.extract_strings(&path, None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "'strings' command not found. Install binutils package."
        );
    }

    #[tokio::test]
    async fn test_get_file_info() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, _) = analyzer(
            FakeRunner::default().respond("file -b", "ELF 64-bit LSB shared object, x86-64\n"),
        );

        let text = analyzer.get_file_info(&path).await.unwrap();
        assert_eq!(text, "File Info: ELF 64-bit LSB shared object, x86-64");
    }

    #[tokio::test]
    async fn test_check_security_prefers_checksec() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, runner) = analyzer(
            FakeRunner::default().respond("checksec", "RELRO           STACK CANARY\nFull RELRO      Canary found\n"),
        );

        let text = analyzer.check_security(&path).await.unwrap();

        assert!(text.starts_with("=== Security Features: sample.bin ===\n\n"));
        assert!(text.contains("Canary found"));
        assert_eq!(
            runner.calls(),
            vec![format!("checksec --file={}", path.display())]
        );
    }

    #[tokio::test]
    async fn test_check_security_manual_fallback() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, _) = analyzer(
            FakeRunner::default()
                .missing("checksec")
                .respond(
                    "readelf -lW",
                    "  GNU_STACK 0x000000 0x0 0x0 0x000000 0x000000 RW  0x10\n  GNU_RELRO 0x0 0x0 0x0 0x0 0x0 R 0x1\n",
                )
                .respond("readelf -h", "  Type:  DYN (Position-Independent Executable file)\n")
                .respond("readelf -d", " 0x000000000000001e (FLAGS)  BIND_NOW\n")
                .respond("nm", "nm: sample.bin: no symbols\n")
                .respond("nm -D", "                 U __stack_chk_fail@GLIBC_2.4\n"),
        );

        let text = analyzer.check_security(&path).await.unwrap();

        assert!(text.contains("NX (No Execute): Enabled"));
        assert!(text.contains("PIE: Enabled"));
        assert!(text.contains("Stack Canary: Enabled"));
        assert!(text.contains("RELRO: Full"));
    }

    #[tokio::test]
    async fn test_check_security_without_tools_adds_note() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, _) = analyzer(FakeRunner::default());

        let text = analyzer.check_security(&path).await.unwrap();
        assert!(text.ends_with(SECURITY_TOOLS_NOTE));
        assert!(!text.contains("PIE:"));
    }

    #[tokio::test]
    async fn test_check_security_keeps_readelf_results_without_nm() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, _) = analyzer(
            FakeRunner::default()
                .missing("checksec")
                .respond("readelf -lW", "  GNU_STACK 0x000000 0x0 0x0 0x000000 0x000000 RW  0x10\n")
                .respond("readelf -h", "  Type:  DYN (Position-Independent Executable file)\n")
                .respond("readelf -d", "")
                .missing("nm"),
        );

        let text = analyzer.check_security(&path).await.unwrap();

        assert_eq!(
            text,
            format!(
                "=== Security Features: sample.bin ===\n\nNX (No Execute): Enabled\nPIE: Enabled\nRELRO: None\n{}",
                SECURITY_TOOLS_NOTE
            )
        );
    }

    #[tokio::test]
    async fn test_check_security_stops_at_failing_readelf() {
        let dir = TempDir::new().unwrap();
        let path = sample_file(&dir, b"x");
        let (analyzer, runner) = analyzer(
            FakeRunner::default()
                .missing("checksec")
                .respond("readelf -lW", "  GNU_STACK 0x000000 0x0 0x0 0x000000 0x000000 RWE 0x10\n")
                .fail("readelf -h"),
        );

        let text = analyzer.check_security(&path).await.unwrap();

        assert!(text.contains("NX (No Execute): Disabled"));
        assert!(!text.contains("PIE:"));
        assert!(text.ends_with(SECURITY_TOOLS_NOTE));
        assert!(!runner.calls().iter().any(|call| call.starts_with("nm")));
    }
}
