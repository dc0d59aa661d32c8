use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::server::AppState;

mod chat;
mod home;
mod logs;
mod models;

pub use chat::{ChatPayload, ChatResponse, TokenCounts};
pub use logs::{LogsResponse, MAX_LOG_LIMIT};
pub use models::ModelsResponse;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home::service_info))
        .route("/chat", post(chat::chat))
        .route("/models", get(models::list_models))
        .route("/logs", get(logs::recent_logs))
}
