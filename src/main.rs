use llm_relay::{config, logging::time::RecordTimer, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_timer(RecordTimer)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::Settings::load()?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let aliases: Vec<&str> = config.models.aliases.keys().map(String::as_str).collect();
    tracing::info!("Available models: {}", aliases.join(", "));
    if config.has_api_key() {
        tracing::info!("API key configured: yes");
    } else {
        tracing::warn!(
            "API key configured: no (set {}); chat requests will fail upstream",
            config::settings::API_KEY_ENV
        );
    }

    let app = server::create_app(config).await?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("LLM relay running on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
