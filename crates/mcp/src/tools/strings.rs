// String extraction tool

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{into_tool_result, json_schema_integer, json_schema_object, json_schema_string, Tool};
use anyhow::{Context, Result};
use ghidra_mcp_core::BinaryAnalyzer;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Readable strings in a binary, via `strings -n`
pub struct ExtractStringsTool {
    analyzer: Arc<BinaryAnalyzer>,
}

impl ExtractStringsTool {
    pub fn new(analyzer: Arc<BinaryAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[derive(Debug, Deserialize)]
struct ExtractStringsArgs {
    file_path: PathBuf,
    #[serde(default)]
    min_length: Option<usize>,
}

#[async_trait::async_trait]
impl Tool for ExtractStringsTool {
    fn schema(&self) -> ToolSchema {
        let default_min = self.analyzer.default_min_length();
        ToolSchema {
            name: "extract_strings".to_string(),
            description: "Extract readable strings from a binary file".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "file_path": json_schema_string("Path to the binary file"),
                    "min_length": json_schema_integer(
                        &format!("Minimum string length (default: {})", default_min),
                        default_min as i64,
                    )
                }),
                vec!["file_path"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: ExtractStringsArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for extract_strings")?;

        Ok(into_tool_result(
            self.analyzer
                .extract_strings(&args.file_path, args.min_length)
                .await,
        ))
    }
}
