// File identification tools: analyze_binary and get_file_info

use crate::protocol::{CallToolResult, ToolSchema};
use crate::tools::{into_tool_result, json_schema_object, json_schema_string, FilePathArgs, Tool};
use anyhow::{Context, Result};
use ghidra_mcp_core::BinaryAnalyzer;
use std::sync::Arc;

/// Size, permissions, fingerprint, file type and ELF header of a binary
pub struct AnalyzeBinaryTool {
    analyzer: Arc<BinaryAnalyzer>,
}

impl AnalyzeBinaryTool {
    pub fn new(analyzer: Arc<BinaryAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait::async_trait]
impl Tool for AnalyzeBinaryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "analyze_binary".to_string(),
            description: "Analyze a binary file and get basic information (file type, size, architecture)".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "file_path": json_schema_string("Path to the binary file to analyze")
                }),
                vec!["file_path"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: FilePathArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for analyze_binary")?;

        Ok(into_tool_result(
            self.analyzer.analyze_binary(&args.file_path).await,
        ))
    }
}

/// `file -b` description of any file
pub struct GetFileInfoTool {
    analyzer: Arc<BinaryAnalyzer>,
}

impl GetFileInfoTool {
    pub fn new(analyzer: Arc<BinaryAnalyzer>) -> Self {
        Self { analyzer }
    }
}

#[async_trait::async_trait]
impl Tool for GetFileInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_file_info".to_string(),
            description: "Get detailed file information using 'file' command".to_string(),
            input_schema: json_schema_object(
                serde_json::json!({
                    "file_path": json_schema_string("Path to the file")
                }),
                vec!["file_path"],
            ),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<CallToolResult> {
        let args: FilePathArgs = serde_json::from_value(arguments)
            .context("Invalid arguments for get_file_info")?;

        Ok(into_tool_result(
            self.analyzer.get_file_info(&args.file_path).await,
        ))
    }
}
