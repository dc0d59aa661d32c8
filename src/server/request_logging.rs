use chrono::Utc;

use crate::error::Result;
use crate::logging::ChatLogRecord;
use crate::server::AppState;
use crate::server::provider_dispatch::ChatCompletion;

// 记录一次成功的中转（耗时与近似 token 数）；写入失败时向上返回错误
pub async fn log_chat_exchange(
    app_state: &AppState,
    prompt: &str,
    completion: &ChatCompletion,
) -> Result<()> {
    let record = ChatLogRecord::new(
        Utc::now(),
        &completion.model,
        prompt,
        &completion.response,
        completion.latency_ms,
        completion.prompt_tokens,
        completion.response_tokens,
    );

    if let Err(e) = app_state.log_store.append(record).await {
        tracing::error!("Failed to log request: {}", e);
        return Err(e);
    }
    Ok(())
}
