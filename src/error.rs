use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// 客户端请求不合法（缺少 body / prompt，或模型别名未知）
    #[error("{0}")]
    Validation(String),

    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed: upstream returned {status}: {detail}")]
    UpstreamStatus { status: u16, detail: String },

    #[error("No response from model")]
    EmptyResponse,

    #[error("Failed to read logs: {0}")]
    LogRead(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 上游失败（传输错误、非 2xx、空 choices）
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RelayError::Http(_) | RelayError::UpstreamStatus { .. } | RelayError::EmptyResponse
        )
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), "request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let err = RelayError::Validation("Prompt is required".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Prompt is required");
        assert!(!err.is_upstream());
    }

    #[test]
    fn upstream_failures_map_to_server_error() {
        let err = RelayError::UpstreamStatus {
            status: 503,
            detail: "overloaded".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_upstream());
        assert!(err.to_string().contains("503"));

        assert!(RelayError::EmptyResponse.is_upstream());
        assert_eq!(RelayError::EmptyResponse.to_string(), "No response from model");
    }

    #[test]
    fn log_read_is_not_upstream() {
        let err = RelayError::LogRead("bad row".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.is_upstream());
    }
}
