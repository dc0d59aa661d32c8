use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::RelayError;
use crate::logging::{ChatLogRecord, RecentLogs};
use crate::server::AppState;

pub const MAX_LOG_LIMIT: usize = 1000;

#[derive(Debug, Deserialize, Default)]
pub struct LogsQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<ChatLogRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub async fn recent_logs(
    State(app_state): State<Arc<AppState>>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<LogsResponse>, RelayError> {
    let Query(query) = query.map_err(|e| RelayError::Validation(e.body_text()))?;
    let limit = query
        .limit
        .unwrap_or(app_state.config.logging.recent_limit)
        .clamp(1, MAX_LOG_LIMIT);

    let recent = app_state
        .log_store
        .read_recent(limit)
        .await
        .map_err(|e| RelayError::LogRead(e.to_string()))?;

    let body = match recent {
        RecentLogs::Empty => LogsResponse {
            logs: Vec::new(),
            total_requests: None,
            message: Some("No logs found".to_string()),
        },
        RecentLogs::Found { records, total } => LogsResponse {
            logs: records,
            total_requests: Some(total),
            message: None,
        },
    };
    Ok(Json(body))
}
