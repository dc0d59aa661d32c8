use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::server::AppState;

pub async fn service_info(State(app_state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "message": "LLM Service API",
        "endpoints": {
            "/chat": "POST - Send a prompt to an LLM",
            "/models": "GET - List available models",
            "/logs": "GET - View request logs"
        },
        "example": {
            "url": "/chat",
            "method": "POST",
            "body": {
                "prompt": "Hello, how are you?",
                "model": app_state.models.default_alias()
            }
        }
    }))
}
