use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::types::{ChatLogRecord, RecentLogs};

/// SQLite 版本的请求记录存储
#[derive(Clone)]
pub struct DatabaseLogger {
    connection: Arc<Mutex<Connection>>,
}

impl DatabaseLogger {
    pub async fn new(database_path: &str) -> rusqlite::Result<Self> {
        // 确保数据库文件的目录存在
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return Err(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                        Some(format!("Failed to create directory: {}", e)),
                    ));
                }
                tracing::info!("Created database directory: {}", parent.display());
            }
        }

        let conn = Connection::open(database_path)?;
        tracing::info!("Database initialized at: {}", database_path);

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                model TEXT NOT NULL,
                prompt TEXT NOT NULL,
                response TEXT NOT NULL,
                latency_ms INTEGER NOT NULL,
                prompt_tokens INTEGER NOT NULL,
                response_tokens INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn append(&self, record: &ChatLogRecord) -> rusqlite::Result<i64> {
        let conn = self.connection.lock().await;

        conn.execute(
            "INSERT INTO chat_logs (
                timestamp, model, prompt, response,
                latency_ms, prompt_tokens, response_tokens
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                &record.timestamp,
                &record.model,
                &record.prompt,
                &record.response,
                i64::try_from(record.latency_ms).unwrap_or(i64::MAX),
                record.prompt_tokens,
                record.response_tokens,
            ),
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub async fn read_recent(&self, limit: usize) -> rusqlite::Result<RecentLogs> {
        let conn = self.connection.lock().await;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM chat_logs", [], |row| row.get(0))?;
        if total == 0 {
            return Ok(RecentLogs::Empty);
        }

        let mut stmt = conn.prepare(
            "SELECT timestamp, model, prompt, response,
                    latency_ms, prompt_tokens, response_tokens
             FROM chat_logs
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let log_iter = stmt.query_map([limit], |row| {
            Ok(ChatLogRecord {
                timestamp: row.get(0)?,
                model: row.get(1)?,
                prompt: row.get(2)?,
                response: row.get(3)?,
                latency_ms: row.get::<_, i64>(4)?.max(0) as u64,
                prompt_tokens: row.get(5)?,
                response_tokens: row.get(6)?,
            })
        })?;

        let mut records = Vec::new();
        for log in log_iter {
            records.push(log?);
        }
        // 查询按 id 倒序，返回时恢复写入顺序
        records.reverse();

        Ok(RecentLogs::Found {
            records,
            total: total as usize,
        })
    }
}
