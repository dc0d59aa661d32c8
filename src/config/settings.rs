use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{RelayError, Result};

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const CONFIG_PATH_ENV: &str = "LLM_RELAY_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub models: ModelsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// 即使设置了 HTTP(S)_PROXY 也直连的主机（支持后缀匹配）
    pub proxy_bypass_hosts: Vec<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api".to_string(),
            api_key: None,
            timeout_secs: 60,
            max_tokens: 500,
            temperature: 0.7,
            proxy_bypass_hosts: Vec::new(),
        }
    }
}

impl UpstreamConfig {
    pub fn chat_completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// 请求未携带 `model` 时使用的别名，必须存在于 `aliases`
    pub default: String,
    pub aliases: BTreeMap<String, String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let aliases = BTreeMap::from([
            ("gemini".to_string(), "google/gemini-2.5-flash".to_string()),
            (
                "mistral".to_string(),
                "mistralai/mistral-7b-instruct:free".to_string(),
            ),
        ]);
        Self {
            default: "gemini".to_string(),
            aliases,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Csv,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub backend: StoreBackend,
    pub csv_path: String,
    pub database_path: String,
    pub recent_limit: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Csv,
            csv_path: "logs/requests.csv".to_string(),
            database_path: "logs/requests.db".to_string(),
            recent_limit: 10,
        }
    }
}

impl Settings {
    /// 加载配置：配置文件（可选）+ 环境变量中的上游密钥
    pub fn load() -> Result<Self> {
        let mut settings = match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Settings::default()
            }
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.upstream.api_key = Some(key);
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RelayError::Config(e.to_string()))
    }

    pub fn has_api_key(&self) -> bool {
        self.upstream
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.models.aliases.is_empty() {
            return Err(RelayError::Config("models.aliases cannot be empty".into()));
        }
        for (alias, identifier) in &self.models.aliases {
            if alias.trim().is_empty() || identifier.trim().is_empty() {
                return Err(RelayError::Config(
                    "model alias and identifier cannot be blank".into(),
                ));
            }
        }
        if !self.models.aliases.contains_key(&self.models.default) {
            return Err(RelayError::Config(format!(
                "models.default '{}' is not one of the configured aliases",
                self.models.default
            )));
        }
        if !(0.0..=2.0).contains(&self.upstream.temperature) {
            return Err(RelayError::Config(
                "upstream.temperature must be within [0, 2]".into(),
            ));
        }
        if self.upstream.max_tokens == 0 {
            return Err(RelayError::Config("upstream.max_tokens must be > 0".into()));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(RelayError::Config(
                "upstream.timeout_secs must be > 0".into(),
            ));
        }
        if self.logging.recent_limit == 0 {
            return Err(RelayError::Config(
                "logging.recent_limit must be > 0".into(),
            ));
        }
        Ok(())
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        let possible_names = ["custom-config.toml", "config.toml"];
        possible_names
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}
