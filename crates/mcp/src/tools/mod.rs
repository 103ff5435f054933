pub mod binary;
pub mod security;
pub mod strings;
mod registry;

pub use binary::{AnalyzeBinaryTool, GetFileInfoTool};
pub use registry::{json_schema_integer, json_schema_object, json_schema_string, Tool, ToolRegistry};
pub use security::CheckSecurityTool;
pub use strings::ExtractStringsTool;

use crate::protocol::{CallToolResult, ToolContent};
use ghidra_mcp_core::{AnalysisResult, BinaryAnalyzer};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments shared by every tool that takes a single file
#[derive(Debug, Deserialize)]
pub(crate) struct FilePathArgs {
    pub file_path: PathBuf,
}

/// Registry holding the four binary analysis tools
pub fn binary_analysis_registry(analyzer: Arc<BinaryAnalyzer>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(AnalyzeBinaryTool::new(analyzer.clone())));
    registry.register(Arc::new(ExtractStringsTool::new(analyzer.clone())));
    registry.register(Arc::new(GetFileInfoTool::new(analyzer.clone())));
    registry.register(Arc::new(CheckSecurityTool::new(analyzer)));
    registry
}

/// Analysis text on success, `Error: ...` flagged as a failure otherwise
pub(crate) fn into_tool_result(result: AnalysisResult<String>) -> CallToolResult {
    match result {
        Ok(text) => CallToolResult::text(text),
        Err(e) => CallToolResult {
            content: vec![ToolContent::error(e.to_string())],
            is_error: Some(true),
        },
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use ghidra_mcp_core::{AnalysisResult, CommandOutput, CommandRunner, StringsConfig};
    use ghidra_mcp_core::BinaryAnalyzer;
    use std::ffi::OsStr;
    use std::sync::Arc;

    /// Every program "succeeds" and prints its own name
    pub struct EchoRunner;

    #[async_trait::async_trait]
    impl CommandRunner for EchoRunner {
        async fn run(&self, program: &str, _args: &[&OsStr]) -> AnalysisResult<CommandOutput> {
            Ok(CommandOutput::ok(format!("{} output\n", program)))
        }
    }

    pub fn echo_analyzer() -> Arc<BinaryAnalyzer> {
        Arc::new(BinaryAnalyzer::new(
            Arc::new(EchoRunner),
            StringsConfig::default(),
        ))
    }
}
