pub mod handlers;
pub(crate) mod model_alias;
pub(crate) mod provider_dispatch;
pub(crate) mod request_logging;
pub mod storage_traits;

pub use model_alias::ModelTable;
pub use provider_dispatch::ChatCompletion;

use crate::config::{LoggingConfig, Settings, StoreBackend};
use crate::error::Result as AppResult;
use crate::logging::{CsvLogStore, DatabaseLogger};
use crate::providers::OpenAIProvider;
use crate::server::storage_traits::ChatLogStore;
use axum::Router;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Settings,
    pub models: ModelTable,
    pub provider: OpenAIProvider,
    pub log_store: Arc<dyn ChatLogStore + Send + Sync>,
}

impl AppState {
    pub fn new(config: Settings, log_store: Arc<dyn ChatLogStore + Send + Sync>) -> AppResult<Self> {
        let models = ModelTable::from_config(&config.models)?;
        let provider = OpenAIProvider::new(&config.upstream)?;
        tracing::debug!("Upstream endpoint: {}", provider.url());
        Ok(Self {
            config,
            models,
            provider,
            log_store,
        })
    }
}

pub async fn open_log_store(cfg: &LoggingConfig) -> AppResult<Arc<dyn ChatLogStore + Send + Sync>> {
    let store: Arc<dyn ChatLogStore + Send + Sync> = match cfg.backend {
        StoreBackend::Csv => {
            tracing::info!("Using CSV request log at {}", cfg.csv_path);
            Arc::new(CsvLogStore::new(&cfg.csv_path))
        }
        StoreBackend::Sqlite => {
            tracing::info!("Using SQLite request log at {}", cfg.database_path);
            Arc::new(DatabaseLogger::new(&cfg.database_path).await?)
        }
    };
    Ok(store)
}

pub async fn create_app(config: Settings) -> AppResult<Router> {
    let log_store = open_log_store(&config.logging).await?;
    let app_state = AppState::new(config, log_store)?;
    Ok(build_router(app_state))
}

pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_origin(AnyOrigin);

    handlers::routes().with_state(Arc::new(app_state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(cors),
    )
}

// 处理器内部 panic 时统一返回 500，进程不退出
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_handler_returns_generic_500() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn sqlite_backend_opens_in_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig {
            backend: StoreBackend::Sqlite,
            database_path: dir.path().join("db/requests.db").to_string_lossy().into_owned(),
            ..LoggingConfig::default()
        };
        let store = open_log_store(&cfg).await.unwrap();
        assert_eq!(
            store.read_recent(10).await.unwrap(),
            crate::logging::RecentLogs::Empty
        );
    }
}
