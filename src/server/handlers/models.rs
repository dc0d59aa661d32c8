use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub available_models: Vec<String>,
    pub model_details: BTreeMap<String, String>,
}

pub async fn list_models(State(app_state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        available_models: app_state.models.aliases().map(str::to_string).collect(),
        model_details: app_state.models.details().clone(),
    })
}
