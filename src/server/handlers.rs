use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use super::SharedState;
use crate::error::{McpError, McpResult};
use crate::schema::Context;
use crate::storage::SessionRecord;

/// Default number of sessions returned by `aether_session_history`.
const DEFAULT_HISTORY_LIMIT: usize = 10;
/// Upper bound on `aether_session_history` page size.
const MAX_HISTORY_LIMIT: usize = 100;

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "aether_analyze" => handle_analyze(state, arguments).await,
        "aether_analyze_document" => handle_analyze_document(state, arguments).await,
        "aether_analyze_report" => handle_analyze_report(state, arguments).await,
        "aether_analyze_document_report" => handle_analyze_document_report(state, arguments).await,
        "aether_session_history" => handle_session_history(state, arguments).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Parameters for the document tools. Exactly one of `path` or `text`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentParams {
    /// Path of a document readable by the server.
    #[serde(default)]
    pub path: Option<String>,
    /// Inline document text.
    #[serde(default)]
    pub text: Option<String>,
}

/// Parameters for session history.
#[derive(Debug, Default, Deserialize)]
pub struct SessionHistoryParams {
    /// Number of most recent sessions to return.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Response for session history.
#[derive(Debug, Serialize)]
pub struct SessionHistoryResponse {
    /// Most recent sessions first.
    pub sessions: Vec<SessionRecord>,
    /// Total number of logged sessions.
    pub total: u64,
}

/// Handle aether_analyze tool call
async fn handle_analyze(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("aether_analyze", arguments, |context: Context| async move {
        state.orchestrator.analyze(&context).await
    })
    .await
}

/// Handle aether_analyze_document tool call
async fn handle_analyze_document(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let tool = "aether_analyze_document";
    let bytes = load_document(tool, parse_arguments(tool, arguments)?).await?;
    let result = state.orchestrator.analyze_document(&bytes).await?;

    serde_json::to_value(result).map_err(McpError::Json)
}

/// Handle aether_analyze_report tool call
async fn handle_analyze_report(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "aether_analyze_report",
        arguments,
        |context: Context| async move { state.orchestrator.analyze_report(&context).await },
    )
    .await
}

/// Handle aether_analyze_document_report tool call
async fn handle_analyze_document_report(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let tool = "aether_analyze_document_report";
    let bytes = load_document(tool, parse_arguments(tool, arguments)?).await?;
    let document = state.orchestrator.analyze_document_report(&bytes).await?;

    serde_json::to_value(document).map_err(McpError::Json)
}

/// Handle aether_session_history tool call
async fn handle_session_history(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: SessionHistoryParams = match arguments {
        Some(args) => {
            serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
                tool_name: "aether_session_history".to_string(),
                message: e.to_string(),
            })?
        }
        None => SessionHistoryParams::default(),
    };

    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    info!(limit, "Listing session history");

    let log = state.session_log();
    let storage_failure = |e: crate::error::StorageError| {
        error!(error = %e, "Failed to read session log");
        McpError::Internal
    };
    let sessions = log.list_recent(limit).await.map_err(storage_failure)?;
    let total = log.count().await.map_err(storage_failure)?;

    serde_json::to_value(SessionHistoryResponse { sessions, total }).map_err(McpError::Json)
}

// ============================================================================
// Helper functions
// ============================================================================

/// Resolve document parameters to raw bytes.
async fn load_document(tool_name: &str, params: DocumentParams) -> McpResult<Vec<u8>> {
    match (params.path, params.text) {
        (Some(path), None) => tokio::fs::read(&path)
            .await
            .map_err(|e| McpError::InvalidParameters {
                tool_name: tool_name.to_string(),
                message: format!("Cannot read document '{}': {}", path, e),
            }),
        (None, Some(text)) => Ok(text.into_bytes()),
        _ => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Provide exactly one of 'path' or 'text'".to_string(),
        }),
    }
}

/// Helper to parse arguments with consistent error handling
fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Parse typed arguments, run the operation and serialize its result.
///
/// Operation errors keep their classification through `Into<McpError>`.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: Into<McpError>,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;

    let result = operation(params).await.map_err(Into::into)?;

    serde_json::to_value(result).map_err(McpError::Json)
}
