use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::RelayError;
use crate::server::AppState;
use crate::server::provider_dispatch::relay_chat;

#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    #[serde(default)]
    pub prompt: Option<String>,
    /// `None` 表示字段缺失；`Some(None)` 表示显式传了 `null`
    #[serde(default, deserialize_with = "present_field")]
    pub model: Option<Option<String>>,
}

fn present_field<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub prompt: String,
    pub response: String,
    pub model: String,
    pub latency_ms: u64,
    pub tokens: TokenCounts,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    pub prompt: u32,
    pub response: u32,
}

pub async fn chat(
    State(app_state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, RelayError> {
    let payload = parse_payload(payload)?;

    let prompt = payload
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or_else(|| RelayError::Validation("Prompt is required".into()))?;

    // 显式 `null` 不回退到默认别名
    let requested = match payload.model {
        None => None,
        Some(Some(model)) => Some(model),
        Some(None) => return Err(app_state.models.invalid_model()),
    };
    let (alias, identifier) = app_state.models.resolve(requested.as_deref())?;
    let (alias, identifier) = (alias.to_string(), identifier.to_string());

    // 在独立任务中中转：客户端断开不会取消上游调用与记录写入
    let state = Arc::clone(&app_state);
    let relay_prompt = prompt.clone();
    let completion = tokio::spawn(async move {
        relay_chat(&state, &alias, &identifier, &relay_prompt).await
    })
    .await
    .map_err(|e| RelayError::Internal(e.to_string()))?
    .map_err(|e| {
        if e.is_upstream() {
            e
        } else {
            RelayError::Internal(e.to_string())
        }
    })?;

    Ok(Json(ChatResponse {
        prompt,
        response: completion.response,
        model: completion.model,
        latency_ms: completion.latency_ms,
        tokens: TokenCounts {
            prompt: completion.prompt_tokens,
            response: completion.response_tokens,
        },
    }))
}

// 缺失 / 非法 JSON、`null` 与空对象都视为“没有提供数据”
fn parse_payload(payload: Result<Json<Value>, JsonRejection>) -> Result<ChatPayload, RelayError> {
    let value = match payload {
        Ok(Json(value)) => value,
        Err(rejection) => {
            tracing::debug!("Rejected chat body: {}", rejection);
            return Err(RelayError::Validation("No JSON data provided".into()));
        }
    };

    let is_empty = match &value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        return Err(RelayError::Validation("No JSON data provided".into()));
    }

    serde_json::from_value(value)
        .map_err(|e| RelayError::Validation(format!("Invalid request body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_and_empty_bodies_count_as_missing() {
        for body in [Value::Null, json!({})] {
            let err = parse_payload(Ok(Json(body))).unwrap_err();
            assert_eq!(err.to_string(), "No JSON data provided");
        }
    }

    #[test]
    fn wrong_field_types_are_validation_errors() {
        let err = parse_payload(Ok(Json(json!({ "prompt": 5 })))).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));

        let err = parse_payload(Ok(Json(json!(["Hi"])))).unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
    }

    #[test]
    fn model_is_optional() {
        let payload = parse_payload(Ok(Json(json!({ "prompt": "Hi", "extra": 1 })))).unwrap();
        assert_eq!(payload.prompt.as_deref(), Some("Hi"));
        assert_eq!(payload.model, None);

        let payload = parse_payload(Ok(Json(json!({ "prompt": "Hi", "model": "mistral" })))).unwrap();
        assert_eq!(payload.model, Some(Some("mistral".to_string())));
    }

    #[test]
    fn explicit_null_model_is_kept_distinct_from_missing() {
        let payload = parse_payload(Ok(Json(json!({ "prompt": "Hi", "model": null })))).unwrap();
        assert_eq!(payload.model, Some(None));
    }
}
