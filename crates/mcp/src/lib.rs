// MCP (Model Context Protocol) server exposing binary analysis tools
// to agent clients (Claude Desktop, etc.)

pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
