pub mod settings;

pub use settings::{
    LoggingConfig, ModelsConfig, ServerConfig, Settings, StoreBackend, UpstreamConfig,
};
