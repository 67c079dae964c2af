use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{SessionLog, SessionRecord};
use crate::error::StorageResult;

/// Session log kept as one JSON document per line.
///
/// Appends are serialized behind a mutex and issued as a single write, so a
/// record is either fully present or absent.
pub struct JsonLinesLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesLog {
    /// Open (creating if needed) the log file at `path`.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        info!(path = %path.display(), "JSON lines session log opened");

        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    /// File backing this log
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_records(&self) -> StorageResult<Vec<SessionRecord>> {
        let contents = fs::read_to_string(&self.path).await?;
        let mut records = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(line) {
                Ok(record) => records.push(record),
                Err(e) => warn!(line = index + 1, error = %e, "Skipping unreadable session record"),
            }
        }

        Ok(records)
    }
}

#[async_trait]
impl SessionLog for JsonLinesLog {
    async fn append(&self, record: &SessionRecord) -> StorageResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> StorageResult<Vec<SessionRecord>> {
        let records = self.read_records().await?;
        Ok(records.into_iter().rev().take(limit).collect())
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.read_records().await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Context, FinalReport};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/logs/sessions.jsonl");

        let log = JsonLinesLog::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(log.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_each_append_is_one_line() {
        let dir = tempdir().unwrap();
        let log = JsonLinesLog::open(dir.path().join("s.jsonl")).await.unwrap();
        let report = FinalReport::new("w", "f", "y", "h");

        log.append(&SessionRecord::completed(&Context::new("a"), &[], &[], &report))
            .await
            .unwrap();
        log.append(&SessionRecord::completed(&Context::new("b"), &[], &[], &report))
            .await
            .unwrap();

        let contents = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);

        let recent = log.list_recent(5).await.unwrap();
        assert_eq!(recent[0].input_context.narrative, "b");
        assert_eq!(recent[1].input_context.narrative, "a");
    }

    #[tokio::test]
    async fn test_unreadable_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        let log = JsonLinesLog::open(&path).await.unwrap();
        let report = FinalReport::new("w", "f", "y", "h");
        log.append(&SessionRecord::completed(&Context::new("a"), &[], &[], &report))
            .await
            .unwrap();

        assert_eq!(log.count().await.unwrap(), 1);
    }
}
