use std::time::Instant;

use crate::config::UpstreamConfig;
use crate::error::{RelayError, Result};
use crate::http_client::client_for_upstream;
use crate::logging::types::truncate_for_log;

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ErrorEnvelope, Message};

/// Text produced by one upstream call plus its wall-clock latency.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub text: String,
    pub latency_ms: u64,
}

/// OpenAI 兼容的 chat completions 客户端（OpenRouter 等）
#[derive(Clone)]
pub struct OpenAIProvider {
    client: reqwest::Client,
    url: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIProvider {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: client_for_upstream(cfg)?,
            url: cfg.chat_completions_url(),
            api_key: cfg.api_key.clone().unwrap_or_default(),
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 单次请求，不重试。`model` 为已解析的完整模型标识
    pub async fn chat_completions(&self, model: &str, prompt: &str) -> Result<UpstreamReply> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_slice(&body).map_err(|e| RelayError::UpstreamStatus {
                status: status.as_u16(),
                detail: format!("invalid response body: {}", e),
            })?;
        let text = parsed.first_text().ok_or(RelayError::EmptyResponse)?;

        Ok(UpstreamReply { text, latency_ms })
    }
}

fn error_detail(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let raw = String::from_utf8_lossy(body);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "empty response body".to_string()
    } else {
        truncate_for_log(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_prefers_openai_error_message() {
        let body = br#"{"error":{"message":"No auth credentials found","code":401}}"#;
        assert_eq!(error_detail(body), "No auth credentials found");
    }

    #[test]
    fn error_detail_falls_back_to_raw_body() {
        assert_eq!(error_detail(b"Service Unavailable"), "Service Unavailable");
        assert_eq!(error_detail(b"   "), "empty response body");
        let long = "x".repeat(400);
        assert_eq!(error_detail(long.as_bytes()).chars().count(), 303);
    }
}
