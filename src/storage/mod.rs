//! Append-only session log.
//!
//! One [`SessionRecord`] is appended per analysis run, completed or failed.
//! Records are never updated once written.

mod json_lines;
mod sqlite;

pub use json_lines::JsonLinesLog;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, SessionLogBackend};
use crate::error::{PipelineError, StorageResult};
use crate::schema::{Context, DebateTrace, Factor, FinalReport};

/// Outcome of a logged run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            other => Err(format!("Unknown session status: {}", other)),
        }
    }
}

/// Failure summary stored with a failed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub reason: String,
}

/// One analysis run as persisted in the session log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub status: SessionStatus,
    pub input_context: Context,
    #[serde(default)]
    pub factors: Vec<Factor>,
    #[serde(default)]
    pub debate_logs: Vec<DebateTrace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_report: Option<FinalReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl SessionRecord {
    /// Record for a run that reached `Complete`.
    pub fn completed(
        context: &Context,
        factors: &[Factor],
        debate_logs: &[DebateTrace],
        final_report: &FinalReport,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            status: SessionStatus::Completed,
            input_context: context.clone(),
            factors: factors.to_vec(),
            debate_logs: debate_logs.to_vec(),
            final_report: Some(final_report.clone()),
            error: None,
        }
    }

    /// Record for a run that ended in `Failed`. Failed runs keep whatever
    /// factors were extracted but never partial debate results.
    pub fn failed(context: &Context, factors: &[Factor], error: &PipelineError) -> Self {
        let diagnostic = error.diagnostic();
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            status: SessionStatus::Failed,
            input_context: context.clone(),
            factors: factors.to_vec(),
            debate_logs: Vec::new(),
            final_report: None,
            error: Some(SessionError {
                kind: diagnostic.kind.to_string(),
                stage: error.stage().map(str::to_string),
                reason: diagnostic.reason,
            }),
        }
    }
}

/// Persistent, append-only sequence of session records.
#[async_trait]
pub trait SessionLog: Send + Sync {
    /// Append one record atomically with respect to other appends.
    async fn append(&self, record: &SessionRecord) -> StorageResult<()>;
    /// Most recent records first, at most `limit`.
    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<SessionRecord>>;
    /// Number of records in the log.
    async fn count(&self) -> StorageResult<u64>;
}

/// Open the session log backend selected in `config`.
pub async fn open_session_log(config: &Config) -> StorageResult<Arc<dyn SessionLog>> {
    Ok(match config.session_log.backend {
        SessionLogBackend::Sqlite => Arc::new(SqliteStorage::new(&config.database).await?),
        SessionLogBackend::JsonLines => {
            Arc::new(JsonLinesLog::open(&config.session_log.json_path).await?)
        }
    })
}
