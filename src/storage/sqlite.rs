use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};

use super::{SessionLog, SessionRecord, SessionStatus};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed session log
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Single-connection in-memory database
    pub async fn new_in_memory() -> StorageResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to open in-memory database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl SessionLog for SqliteStorage {
    async fn append(&self, record: &SessionRecord) -> StorageResult<()> {
        let payload = serde_json::to_string(record)?;

        sqlx::query(
            r#"
            INSERT INTO session_logs (id, created_at, status, error_kind, record)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(record.timestamp.to_rfc3339())
        .bind(record.status.as_str())
        .bind(record.error.as_ref().map(|e| e.kind.as_str()))
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<SessionRecord>> {
        let rows: Vec<SessionLogRow> = sqlx::query_as(
            r#"
            SELECT id, created_at, status, record
            FROM session_logs
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SessionRecord::try_from).collect()
    }

    async fn count(&self) -> StorageResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM session_logs")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

// Internal row type for SQLx mapping
#[derive(sqlx::FromRow)]
struct SessionLogRow {
    id: String,
    created_at: String,
    status: String,
    record: String,
}

impl TryFrom<SessionLogRow> for SessionRecord {
    type Error = StorageError;

    fn try_from(row: SessionLogRow) -> Result<Self, Self::Error> {
        let record: SessionRecord = serde_json::from_str(&row.record)?;

        // Indexed columns are derived from the record; flag drift but trust the record.
        let status_matches = SessionStatus::from_str(&row.status).ok() == Some(record.status);
        let time_matches = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc) == record.timestamp)
            .unwrap_or(false);
        if row.id != record.id || !status_matches || !time_matches {
            warn!(id = %row.id, "Session log row columns disagree with stored record");
        }

        Ok(record)
    }
}
