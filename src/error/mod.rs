use serde::Serialize;
use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("Session log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Langbase API errors
#[derive(Debug, Error)]
pub enum LangbaseError {
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while running an analysis.
///
/// Stage variants keep the raw provider output so a caller can see exactly
/// what the model produced when a reasoning stage misbehaves.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Malformed output: {reason}")]
    MalformedOutput { raw_output: String, reason: String },

    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Debate stage '{stage}' failed: {reason}")]
    Debate {
        stage: &'static str,
        raw_output: String,
        reason: String,
    },

    #[error("Synthesis stage failed: {reason}")]
    Synthesis { raw_output: String, reason: String },

    #[error("Ingestion failed: {message}")]
    Ingestion { message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] LangbaseError),
}

/// Who is responsible for a failure, as seen from the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// The caller supplied unusable input.
    Client,
    /// A reasoning stage or its provider call failed.
    Stage,
    /// Anything not anticipated by the pipeline.
    Internal,
}

/// Structured diagnostic surfaced for stage failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageDiagnostic {
    pub kind: &'static str,
    pub stage: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
}

impl PipelineError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MalformedOutput { .. } => "malformed_output",
            PipelineError::Validation { .. } => "validation_error",
            PipelineError::InvalidInput { .. } => "invalid_input",
            PipelineError::Debate { .. } => "debate_error",
            PipelineError::Synthesis { .. } => "synthesis_error",
            PipelineError::Ingestion { .. } => "ingestion_error",
            PipelineError::Transport(_) => "transport_error",
        }
    }

    /// Classify the error for the request boundary.
    pub fn fault(&self) -> Fault {
        match self {
            PipelineError::InvalidInput { .. } | PipelineError::Ingestion { .. } => Fault::Client,
            _ => Fault::Stage,
        }
    }

    /// Stage name the error originated from, if any.
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::Debate { stage, .. } => Some(stage),
            PipelineError::Synthesis { .. } => Some("synthesis"),
            PipelineError::MalformedOutput { .. } | PipelineError::Validation { .. } => {
                Some("factor_extraction")
            }
            PipelineError::Ingestion { .. } => Some("ingestion"),
            PipelineError::InvalidInput { .. } | PipelineError::Transport(_) => None,
        }
    }

    /// Raw provider output attached to the error, if any.
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            PipelineError::MalformedOutput { raw_output, .. }
            | PipelineError::Debate { raw_output, .. }
            | PipelineError::Synthesis { raw_output, .. } => Some(raw_output),
            _ => None,
        }
    }

    /// Build the structured diagnostic for this error.
    pub fn diagnostic(&self) -> StageDiagnostic {
        let reason = match self {
            PipelineError::MalformedOutput { reason, .. }
            | PipelineError::Validation { reason, .. }
            | PipelineError::InvalidInput { reason, .. }
            | PipelineError::Debate { reason, .. }
            | PipelineError::Synthesis { reason, .. } => reason.clone(),
            PipelineError::Ingestion { message } => message.clone(),
            PipelineError::Transport(e) => e.to_string(),
        };

        StageDiagnostic {
            kind: self.kind(),
            stage: self.stage().unwrap_or("provider").to_string(),
            reason,
            raw_output: self.raw_output().map(str::to_string),
        }
    }
}

impl AppError {
    /// Classify the error for the request boundary.
    pub fn fault(&self) -> Fault {
        match self {
            AppError::Pipeline(e) => e.fault(),
            _ => Fault::Internal,
        }
    }
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Stage failure: {}", .diagnostic.reason)]
    StageFailed { diagnostic: StageDiagnostic },

    #[error("Internal error")]
    Internal,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Pipeline(e) => e.into(),
            AppError::Mcp(e) => e,
            _ => McpError::Internal,
        }
    }
}

impl From<PipelineError> for McpError {
    fn from(err: PipelineError) -> Self {
        match err.fault() {
            Fault::Client => McpError::InvalidRequest {
                message: err.to_string(),
            },
            Fault::Stage => McpError::StageFailed {
                diagnostic: err.diagnostic(),
            },
            Fault::Internal => McpError::Internal,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for Langbase operations
pub type LangbaseResult<T> = Result<T, LangbaseError>;

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;
