use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::to_iso8601_utc_string;

/// 记录文件表头（字段顺序固定）
pub const LOG_HEADER: [&str; 7] = [
    "timestamp",
    "model",
    "prompt",
    "response",
    "latency_ms",
    "prompt_tokens",
    "response_tokens",
];

/// prompt / response 在记录中保留的最大字符数
pub const MAX_LOGGED_CHARS: usize = 300;
pub const TRUNCATION_MARKER: &str = "...";

/// One relayed exchange. Field order matches [`LOG_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLogRecord {
    pub timestamp: String,
    pub model: String,
    pub prompt: String,
    pub response: String,
    pub latency_ms: u64,
    pub prompt_tokens: u32,
    pub response_tokens: u32,
}

impl ChatLogRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        model: &str,
        prompt: &str,
        response: &str,
        latency_ms: u64,
        prompt_tokens: u32,
        response_tokens: u32,
    ) -> Self {
        Self {
            timestamp: to_iso8601_utc_string(&timestamp),
            model: model.to_string(),
            prompt: truncate_for_log(prompt),
            response: truncate_for_log(response),
            latency_ms,
            prompt_tokens,
            response_tokens,
        }
    }
}

/// Keeps the first [`MAX_LOGGED_CHARS`] characters and appends the marker when cut.
pub fn truncate_for_log(s: &str) -> String {
    match s.char_indices().nth(MAX_LOGGED_CHARS) {
        Some((cut, _)) => format!("{}{}", &s[..cut], TRUNCATION_MARKER),
        None => s.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecentLogs {
    /// 存储尚未创建
    Empty,
    Found {
        records: Vec<ChatLogRecord>,
        total: usize,
    },
}

impl RecentLogs {
    /// 从完整记录中取最后 `limit` 条（保持原顺序）
    pub fn from_all(mut all: Vec<ChatLogRecord>, limit: usize) -> Self {
        let total = all.len();
        let records = all.split_off(total.saturating_sub(limit));
        RecentLogs::Found { records, total }
    }
}
