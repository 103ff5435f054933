// MCP server: newline-delimited JSON-RPC over stdio
//
// Requests are handled strictly one at a time, in arrival order. Stdout only
// ever carries protocol messages; logs go to stderr.

use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, ListToolsResult, ServerCapabilities, ServerInfo,
    ToolsCapability, PROTOCOL_VERSION,
};
use crate::tools::ToolRegistry;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, FramedRead, FramedWrite, LinesCodec};

/// Longest accepted request line
pub const MAX_LINE_LENGTH: usize = 8 * 1024 * 1024;

pub struct McpServer {
    registry: ToolRegistry,
    server_info: ServerInfo,
    instructions: Option<String>,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            server_info: ServerInfo {
                name: "ghidra-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: None,
        }
    }

    /// Text returned to the client in the `initialize` result
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Serve on the process's stdin/stdout until the client disconnects
    pub async fn start(&self) -> Result<()> {
        tracing::info!("MCP server listening on stdio");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve one session over an arbitrary byte stream pair
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        // Framed on raw bytes so a line that is not UTF-8 does not end the stream
        let mut requests = FramedRead::new(
            reader,
            AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), MAX_LINE_LENGTH),
        );
        let mut responses = FramedWrite::new(writer, LinesCodec::new());

        let mut closing = false;
        while let Some(chunk) = requests.next().await {
            let response = match chunk {
                Ok(chunk) => match std::str::from_utf8(&chunk) {
                    Ok(line) if line.trim().is_empty() => continue,
                    Ok(line) => self.handle_line(line).await,
                    Err(e) => {
                        tracing::warn!("Request is not valid UTF-8: {}", e);
                        Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
                    }
                },
                // framing is lost once a line overflows
                Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                    tracing::warn!("Request exceeds {} bytes, closing session", MAX_LINE_LENGTH);
                    closing = true;
                    Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()))
                }
                Err(AnyDelimiterCodecError::Io(e)) => {
                    return Err(e).context("Failed to read request");
                }
            };

            if let Some(response) = response {
                let json = serde_json::to_string(&response).context("Failed to encode response")?;
                responses
                    .send(json)
                    .await
                    .context("Failed to write response")?;
            }
            if closing {
                break;
            }
        }

        tracing::info!("Client disconnected, shutting down");
        Ok(())
    }

    /// Handle one raw message; `None` means nothing is sent back
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Unparseable message: {}", e);
                return Some(JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error()));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("Malformed request: {}", e);
                return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request()));
        }

        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);

        tracing::debug!("Request {} ({})", request.method, id);

        let result = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => to_result(&ListToolsResult {
                tools: self.registry.list_schemas(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            other => {
                tracing::warn!("Unsupported method: {}", other);
                Err(JsonRpcError::method_not_found(other))
            }
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => tracing::info!("Client initialized"),
            method => tracing::debug!("Ignoring notification {}", method),
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        match params.map(serde_json::from_value::<InitializeParams>) {
            Some(Ok(params)) => tracing::info!(
                "Initializing session for {} {} (protocol {})",
                params.client_info.name,
                params.client_info.version,
                params.protocol_version
            ),
            Some(Err(e)) => tracing::debug!("Unrecognised initialize params: {}", e),
            None => {}
        }

        to_result(&InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params for tools/call"))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| {
                    JsonRpcError::invalid_params(format!("Invalid tools/call params: {}", e))
                })
            })?;

        let result = match self.registry.get(&params.name) {
            Some(tool) => {
                tracing::info!("Calling tool {}", params.name);
                match tool.execute(params.arguments).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!("Tool {} failed: {:#}", params.name, e);
                        CallToolResult::failure(format!("Error executing {}: {:#}", params.name, e))
                    }
                }
            }
            None => {
                tracing::warn!("Unknown tool requested: {}", params.name);
                CallToolResult::failure(format!("Unknown tool: {}", params.name))
            }
        };

        to_result(&result)
    }
}

fn to_result<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}
