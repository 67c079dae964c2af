//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! This module provides the core MCP server implementation including:
//! - JSON-RPC 2.0 request/response handling
//! - Tool definitions and schemas
//! - Line-delimited server communication (stdio in production)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::{handle_tool_call, SharedState};
use crate::error::McpError;

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// JSON-RPC code for malformed request lines.
pub const PARSE_ERROR: i32 = -32700;
/// JSON-RPC code for unknown methods.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC code for caller-supplied input that cannot be used.
pub const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC code for unexpected server failures.
pub const INTERNAL_ERROR: i32 = -32603;
/// Server-defined code for a failed reasoning stage.
pub const STAGE_FAILED: i32 = -32000;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null if notification).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    /// The server name identifier.
    pub name: String,
    /// The server version string.
    pub version: String,
}

/// MCP server capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    /// Tool-related capabilities.
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the MCP initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    /// The MCP protocol version supported.
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    /// Server capabilities.
    pub capabilities: Capabilities,
    /// Server identification information.
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique tool name (used in tool calls).
    pub name: String,
    /// Human-readable description of the tool.
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    /// The name of the tool to invoke.
    pub name: String,
    /// Optional arguments for the tool.
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (e.g., "text").
    #[serde(rename = "type")]
    pub content_type: String,
    /// The text content of the result.
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    /// The result content items.
    pub content: Vec<ToolResultContent>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self::error_with_data(id, code, message, None)
    }

    /// Create an error response carrying structured data
    pub fn error_with_data(
        id: Option<Value>,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }

    /// Map a tool failure onto its JSON-RPC error.
    ///
    /// Caller faults become `-32602`, stage failures `-32000` with the
    /// diagnostic as `data`, and anything else a bare `-32603`.
    pub fn from_mcp_error(id: Option<Value>, err: McpError) -> Self {
        match err {
            McpError::InvalidRequest { .. }
            | McpError::InvalidParameters { .. }
            | McpError::UnknownTool { .. } => Self::error(id, INVALID_PARAMS, err.to_string()),
            McpError::StageFailed { diagnostic } => {
                let message = format!("Stage '{}' failed: {}", diagnostic.stage, diagnostic.reason);
                let data = serde_json::to_value(&diagnostic).ok();
                Self::error_with_data(id, STAGE_FAILED, message, data)
            }
            McpError::Internal | McpError::Json(_) => {
                Self::error(id, INTERNAL_ERROR, "Internal error")
            }
        }
    }
}

/// MCP Server speaking line-delimited JSON-RPC 2.0.
pub struct McpServer {
    /// Shared application state.
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server using async stdio
    pub async fn run(&self) -> std::io::Result<()> {
        info!("AETHER MCP server starting...");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            // Notifications get no response
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request.
    /// Returns None for notifications (requests without id).
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" => {
                debug!("Received initialized notification");
                None
            }
            "notifications/cancelled" => {
                debug!("Received cancelled notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        METHOD_NOT_FOUND,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "aether-reasoning".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error")
            }
        }
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");

        JsonRpcResponse::success(
            id,
            serde_json::json!({
                "tools": tool_definitions()
            }),
        )
    }

    /// Handle tools/call request
    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let result = match handle_tool_call(&self.state, &params.name, params.arguments).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %params.name, error = %e, "Tool call failed");
                return JsonRpcResponse::from_mcp_error(id, e);
            }
        };

        let text = match serde_json::to_string_pretty(&result) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to serialize tool result");
                return JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error");
            }
        };

        let tool_result = ToolCallResult {
            content: vec![ToolResultContent {
                content_type: "text".to_string(),
                text,
            }],
        };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id, INTERNAL_ERROR, "Internal error")
            }
        }
    }
}

/// Every tool this server exposes, in listing order.
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        get_analyze_tool(),
        get_analyze_document_tool(),
        get_analyze_report_tool(),
        get_analyze_document_report_tool(),
        get_session_history_tool(),
    ]
}

fn context_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "narrative": {
                "type": "string",
                "description": "Main report text to analyze"
            },
            "extracted_facts": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Facts already pulled out of the report"
            },
            "metrics": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "region": { "type": "string" },
                        "value": { "type": "number" }
                    },
                    "required": ["name", "value"]
                },
                "description": "Named numeric measurements"
            },
            "assumptions": {
                "type": "array",
                "items": { "type": "string" }
            },
            "limitations": {
                "type": "array",
                "items": { "type": "string" }
            }
        },
        "required": ["narrative"]
    })
}

fn document_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Path to a PDF or a UTF-8 text, markdown or TSV document"
            },
            "text": {
                "type": "string",
                "description": "Inline document content"
            }
        },
        "oneOf": [
            { "required": ["path"] },
            { "required": ["text"] }
        ],
        "additionalProperties": false
    })
}

/// Get the structured analysis tool definition
fn get_analyze_tool() -> Tool {
    Tool {
        name: "aether_analyze".to_string(),
        description: "Decompose a report into causal factors, debate each factor (support vs opposition), and synthesize a scored verdict.".to_string(),
        input_schema: context_schema(),
    }
}

/// Get the document analysis tool definition
fn get_analyze_document_tool() -> Tool {
    Tool {
        name: "aether_analyze_document".to_string(),
        description: "Extract narrative text and table metrics from a document, then run the full factor debate analysis.".to_string(),
        input_schema: document_schema(),
    }
}

/// Get the rendered report tool definition
fn get_analyze_report_tool() -> Tool {
    Tool {
        name: "aether_analyze_report".to_string(),
        description: "Run the factor debate analysis and return a paginated markdown report.".to_string(),
        input_schema: context_schema(),
    }
}

/// Get the document-to-report tool definition
fn get_analyze_document_report_tool() -> Tool {
    Tool {
        name: "aether_analyze_document_report".to_string(),
        description: "Analyze a document and return a paginated markdown report.".to_string(),
        input_schema: document_schema(),
    }
}

/// Get the session history tool definition
fn get_session_history_tool() -> Tool {
    Tool {
        name: "aether_session_history".to_string(),
        description: "List the most recent analysis sessions, completed and failed.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 100,
                    "description": "Maximum sessions to return (default 10)"
                }
            },
            "additionalProperties": false
        }),
    }
}
