use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{RelayError, Result};

use super::types::{ChatLogRecord, LOG_HEADER, RecentLogs};

/// Append-only CSV request log.
///
/// Every record is encoded in memory first and written with a single
/// `write_all` on a handle opened in append mode, so a row is never split
/// across concurrent writers.
#[derive(Clone)]
pub struct CsvLogStore {
    path: PathBuf,
    // 仅用于串行化“首次创建文件 + 表头”与追加
    write_lock: Arc<Mutex<()>>,
}

impl CsvLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn append(&self, record: ChatLogRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_blocking(&path, &record))
            .await
            .map_err(|e| RelayError::Internal(e.to_string()))?
    }

    pub async fn read_recent(&self, limit: usize) -> Result<RecentLogs> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_recent_blocking(&path, limit))
            .await
            .map_err(|e| RelayError::Internal(e.to_string()))?
    }
}

fn row_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| RelayError::Io(e.into_error()))
}

fn encode_header() -> Result<Vec<u8>> {
    let mut writer = row_writer();
    writer.write_record(LOG_HEADER)?;
    finish(writer)
}

fn encode_record(record: &ChatLogRecord) -> Result<Vec<u8>> {
    let mut writer = row_writer();
    writer.serialize(record)?;
    finish(writer)
}

fn create_with_header(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            tracing::info!("Created log directory: {}", parent.display());
        }
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(&encode_header()?)?;
            tracing::info!("Created request log at: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn append_blocking(path: &Path, record: &ChatLogRecord) -> Result<()> {
    create_with_header(path)?;
    let row = encode_record(record)?;
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(&row)?;
    Ok(())
}

fn read_recent_blocking(path: &Path, limit: usize) -> Result<RecentLogs> {
    if !path.exists() {
        return Ok(RecentLogs::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    let all = reader
        .deserialize::<ChatLogRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RecentLogs::from_all(all, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(prompt: &str, latency_ms: u64) -> ChatLogRecord {
        ChatLogRecord::new(Utc::now(), "mistral", prompt, "Hello!", latency_ms, 1, 1)
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLogStore::new(dir.path().join("logs/requests.csv"));
        assert_eq!(store.read_recent(10).await.unwrap(), RecentLogs::Empty);
    }

    #[tokio::test]
    async fn first_append_creates_directory_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/requests.csv");
        let store = CsvLogStore::new(&path);

        store.append(record("Hi", 12)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,model,prompt,response,latency_ms,prompt_tokens,response_tokens")
        );
        assert!(lines.next().unwrap().contains(",mistral,Hi,Hello!,12,1,1"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn append_then_read_returns_record_last() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLogStore::new(dir.path().join("requests.csv"));
        store.append(record("first", 1)).await.unwrap();

        let before = match store.read_recent(10).await.unwrap() {
            RecentLogs::Found { total, .. } => total,
            RecentLogs::Empty => panic!("store should exist"),
        };

        let latest = record("needs, \"quoting\"\nand a newline", 2);
        store.append(latest.clone()).await.unwrap();

        match store.read_recent(1).await.unwrap() {
            RecentLogs::Found { records, total } => {
                assert_eq!(total, before + 1);
                assert_eq!(records, vec![latest]);
            }
            RecentLogs::Empty => panic!("store should exist"),
        }
    }

    #[tokio::test]
    async fn header_only_file_has_zero_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.csv");
        std::fs::write(&path, format!("{}\n", LOG_HEADER.join(","))).unwrap();
        let store = CsvLogStore::new(&path);
        assert_eq!(
            store.read_recent(10).await.unwrap(),
            RecentLogs::Found {
                records: vec![],
                total: 0
            }
        );
    }

    #[tokio::test]
    async fn malformed_rows_surface_as_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("requests.csv");
        std::fs::write(
            &path,
            format!("{}\n2026-01-01T00:00:00.000Z,gemini,p,r,not-a-number,1,1\n", LOG_HEADER.join(",")),
        )
        .unwrap();
        let store = CsvLogStore::new(&path);
        assert!(matches!(
            store.read_recent(10).await,
            Err(RelayError::Csv(_))
        ));

        std::fs::write(&path, format!("{}\nonly,three,cols\n", LOG_HEADER.join(","))).unwrap();
        assert!(store.read_recent(10).await.is_err());
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_lose_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvLogStore::new(dir.path().join("requests.csv"));

        let mut handles = Vec::new();
        for i in 0..20u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append(record(&format!("prompt {i}"), i)).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        match store.read_recent(100).await.unwrap() {
            RecentLogs::Found { records, total } => {
                assert_eq!(total, 20);
                let mut latencies: Vec<_> = records.iter().map(|r| r.latency_ms).collect();
                latencies.sort_unstable();
                assert_eq!(latencies, (0..20).collect::<Vec<_>>());
            }
            RecentLogs::Empty => panic!("store should exist"),
        }
    }
}
