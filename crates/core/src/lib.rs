// Core binary analysis for the Ghidra MCP server

pub mod analysis;
pub mod config;
pub mod error;
pub mod ghidra;
pub mod runner;
pub mod security;

pub use analysis::BinaryAnalyzer;
pub use config::{ServerConfig, StringsConfig};
pub use error::{AnalysisError, AnalysisResult};
pub use ghidra::GhidraInstall;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
