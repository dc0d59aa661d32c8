use crate::error::Result;
use crate::server::AppState;
use crate::server::request_logging::log_chat_exchange;
use crate::tokens::estimate_tokens;

/// 一次成功中转的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatCompletion {
    pub response: String,
    pub latency_ms: u64,
    pub prompt_tokens: u32,
    pub response_tokens: u32,
    pub model: String,
}

// 调用上游 → 估算 token → 写入记录；只有成功的调用会被记录
pub async fn relay_chat(
    app_state: &AppState,
    alias: &str,
    identifier: &str,
    prompt: &str,
) -> Result<ChatCompletion> {
    let reply = match app_state.provider.chat_completions(identifier, prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(model = alias, "Upstream call failed: {}", e);
            return Err(e);
        }
    };

    let completion = ChatCompletion {
        prompt_tokens: estimate_tokens(prompt),
        response_tokens: estimate_tokens(&reply.text),
        response: reply.text,
        latency_ms: reply.latency_ms,
        model: alias.to_string(),
    };

    log_chat_exchange(app_state, prompt, &completion).await?;

    tracing::info!(
        model = alias,
        latency_ms = completion.latency_ms,
        prompt_tokens = completion.prompt_tokens,
        response_tokens = completion.response_tokens,
        "Relayed chat request"
    );

    Ok(completion)
}
