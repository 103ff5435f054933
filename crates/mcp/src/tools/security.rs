// Exploit-mitigation check tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{into_tool_result, json_schema_object, json_schema_string, FilePathArgs, Tool};
use anyhow::{Context, Result};
use ghidra_mcp_core::BinaryAnalyzer;
use std::sync::Arc;

/// NX, PIE, stack canary and RELRO status of an ELF binary
pub struct CheckSecurityTool {
    analyzer: Arc<BinaryAnalyzer>,
}

impl CheckSecurityTool {
    pub fn new(analyzer: Arc<BinaryAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait::async_trait]
impl Tool for CheckSecurityTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "check_security".to_string(),
            description: "Check binary security features (NX, PIE, Stack Canary, RELRO)".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "file_path": json_schema_string("Path to the binary file")
                }),
                vec!["file_path"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: FilePathArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for check_security")?;

        Ok(into_tool_result(
            self.analyzer.check_security(&args.file_path).await,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::echo_analyzer;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_checksec_output_is_returned() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("vuln");
        std::fs::write(&path, b"\x7fELF").unwrap();
        let tool = CheckSecurityTool::new(echo_analyzer());

        let result = tool
            .execute(serde_json::json!({"file_path": path}))
            .await
            .unwrap();

        assert!(result.is_error.is_none());
        assert_eq!(
            result.content[0].as_text(),
            "=== Security Features: vuln ===\n\nchecksec output\n"
        );
    }
}
