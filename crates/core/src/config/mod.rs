//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGELENS_*)
//! 2. TOML config file (if PAGELENS_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error_log::{DEFAULT_ERROR_LIMIT, ErrorLog};
use crate::history::{DEFAULT_LIMIT, HistoryOptions, HistoryStore};
use crate::signature::SignatureStrategy;
use crate::Error;
use crate::storage::{CacheDb, KvStore, MemoryStore};

mod validation;

pub use validation::ConfigError;

/// Namespace names inside the SQLite database.
pub const LOCAL_NAMESPACE: &str = "local";
pub const SYNC_NAMESPACE: &str = "sync";

/// Where the key-value namespaces live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

/// AI chat-completion API flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    OpenAi,
    Anthropic,
    /// Any OpenAI-compatible endpoint; `endpoint` is required.
    Custom,
}

impl AiProvider {
    pub fn default_endpoint(self) -> Option<&'static str> {
        match self {
            AiProvider::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            AiProvider::Anthropic => Some("https://api.anthropic.com/v1/messages"),
            AiProvider::Custom => None,
        }
    }

    pub fn default_model(self) -> Option<&'static str> {
        match self {
            AiProvider::OpenAi => Some("gpt-3.5-turbo"),
            AiProvider::Anthropic => Some("claude-3-haiku-20240307"),
            AiProvider::Custom => None,
        }
    }
}

/// Settings for the AI chat-completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub provider: AiProvider,

    /// Full chat endpoint URL. Defaults per provider.
    ///
    /// Set via PAGELENS_AI__ENDPOINT.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Set via PAGELENS_AI__API_KEY.
    #[serde(default)]
    pub api_key: String,

    /// Model name. Defaults per provider.
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in milliseconds.
    #[serde(default = "default_ai_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_ai_timeout_ms() -> u64 {
    30_000
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            endpoint: None,
            api_key: String::new(),
            model: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_ai_timeout_ms(),
        }
    }
}

impl AiConfig {
    /// The configured endpoint, or the provider's default.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| self.provider.default_endpoint())
    }

    /// The configured model, or the provider's default.
    pub fn model_name(&self) -> Option<&str> {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.provider.default_model())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGELENS_*, nested keys split on `__`)
/// 2. TOML config file (if PAGELENS_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Storage backend for the history namespaces.
    ///
    /// Set via PAGELENS_STORAGE environment variable.
    #[serde(default)]
    pub storage: StorageBackend,

    /// Path to SQLite database.
    ///
    /// Set via PAGELENS_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Maximum number of analysis history entries.
    ///
    /// Set via PAGELENS_HISTORY_LIMIT environment variable.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum number of captured errors kept.
    ///
    /// Set via PAGELENS_ERROR_LOG_LIMIT environment variable.
    #[serde(default = "default_error_log_limit")]
    pub error_log_limit: usize,

    /// Signature strategy: "sha256" or "fallback".
    ///
    /// Set via PAGELENS_SIGNATURE_STRATEGY environment variable.
    #[serde(default)]
    pub signature_strategy: SignatureStrategy,

    /// Per-item byte quota for the synced namespace.
    ///
    /// Set via PAGELENS_SYNC_ITEM_QUOTA_BYTES environment variable.
    #[serde(default)]
    pub sync_item_quota_bytes: Option<usize>,

    /// AI backend; AI-backed operations are unavailable without it.
    #[serde(default)]
    pub ai: Option<AiConfig>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./pagelens.sqlite")
}

fn default_history_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_error_log_limit() -> usize {
    DEFAULT_ERROR_LIMIT
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::default(),
            db_path: default_db_path(),
            history_limit: default_history_limit(),
            error_log_limit: default_error_log_limit(),
            signature_strategy: SignatureStrategy::default(),
            sync_item_quota_bytes: None,
            ai: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PAGELENS_`
    /// 2. TOML file from `PAGELENS_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGELENS_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PAGELENS_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    pub fn history_options(&self) -> HistoryOptions {
        HistoryOptions {
            limit: self.history_limit,
            signature_strategy: self.signature_strategy,
            ..Default::default()
        }
    }

    /// The AI settings, for operations that cannot run without them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no AI backend is configured.
    pub fn require_ai(&self) -> Result<&AiConfig, ConfigError> {
        self.ai.as_ref().ok_or_else(|| ConfigError::Missing {
            field: "ai".into(),
            hint: "Set PAGELENS_AI__API_KEY (and optionally PAGELENS_AI__PROVIDER) environment variables".into(),
        })
    }

    /// Open the configured storage and build the history store and error
    /// log over it.
    pub async fn open_stores(&self) -> Result<(HistoryStore, ErrorLog), Error> {
        let (local, synced): (Arc<dyn KvStore>, Arc<dyn KvStore>) = match self.storage {
            StorageBackend::Sqlite => {
                let db = CacheDb::open(&self.db_path).await?;
                let local: Arc<dyn KvStore> = Arc::new(db.namespace(LOCAL_NAMESPACE));
                let synced: Arc<dyn KvStore> =
                    Arc::new(db.namespace(SYNC_NAMESPACE).with_quota(self.sync_item_quota_bytes));
                (local, synced)
            }
            StorageBackend::Memory => {
                let local: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
                let synced: Arc<dyn KvStore> = match self.sync_item_quota_bytes {
                    Some(max) => Arc::new(MemoryStore::with_quota(max)),
                    None => Arc::new(MemoryStore::new()),
                };
                (local, synced)
            }
        };

        let history = HistoryStore::with_options(Some(local.clone()), Some(synced), self.history_options());
        let errors = ErrorLog::new(Some(local)).with_limit(self.error_log_limit);
        Ok((history, errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./pagelens.sqlite"));
        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.error_log_limit, 1000);
        assert_eq!(config.signature_strategy, SignatureStrategy::Sha256);
        assert!(config.sync_item_quota_bytes.is_none());
        assert!(config.ai.is_none());
    }

    #[test]
    fn test_ai_defaults_per_provider() {
        let openai = AiConfig::default();
        assert_eq!(openai.endpoint_url(), Some("https://api.openai.com/v1/chat/completions"));
        assert_eq!(openai.model_name(), Some("gpt-3.5-turbo"));
        assert_eq!(openai.timeout(), Duration::from_millis(30_000));

        let anthropic = AiConfig { provider: AiProvider::Anthropic, ..Default::default() };
        assert_eq!(anthropic.endpoint_url(), Some("https://api.anthropic.com/v1/messages"));
        assert_eq!(anthropic.model_name(), Some("claude-3-haiku-20240307"));

        let custom = AiConfig { provider: AiProvider::Custom, ..Default::default() };
        assert_eq!(custom.endpoint_url(), None);
    }

    #[test]
    fn test_ai_explicit_endpoint_wins() {
        let config = AiConfig { endpoint: Some("https://llm.internal/v1/chat".into()), ..Default::default() };
        assert_eq!(config.endpoint_url(), Some("https://llm.internal/v1/chat"));
    }

    #[test]
    fn test_require_ai_missing() {
        let config = AppConfig::default();
        assert!(matches!(config.require_ai(), Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_load_from_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PAGELENS_HISTORY_LIMIT", "5");
            jail.set_env("PAGELENS_SIGNATURE_STRATEGY", "fallback");
            jail.set_env("PAGELENS_AI__API_KEY", "sk-test");
            jail.set_env("PAGELENS_AI__PROVIDER", "anthropic");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.history_limit, 5);
            assert_eq!(config.signature_strategy, SignatureStrategy::Fallback);
            let ai = config.ai.as_ref().ok_or("ai config missing")?;
            assert_eq!(ai.api_key, "sk-test");
            assert_eq!(ai.provider, AiProvider::Anthropic);
            assert_eq!(ai.max_tokens, 1000);
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "pagelens.toml",
                r#"
                storage = "memory"
                history_limit = 7

                [ai]
                provider = "custom"
                endpoint = "https://open.bigmodel.cn/api/paas/v4/chat/completions"
                api_key = "key"
                model = "glm-4"
                "#,
            )?;
            jail.set_env("PAGELENS_CONFIG_FILE", "pagelens.toml");
            jail.set_env("PAGELENS_HISTORY_LIMIT", "9");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.storage, StorageBackend::Memory);
            assert_eq!(config.history_limit, 9);
            assert_eq!(config.ai.as_ref().and_then(AiConfig::model_name), Some("glm-4"));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PAGELENS_HISTORY_LIMIT", "0");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }

    #[tokio::test]
    async fn test_open_memory_stores() {
        let config = AppConfig { storage: StorageBackend::Memory, history_limit: 3, ..Default::default() };
        let (history, errors) = config.open_stores().await.unwrap();
        assert_eq!(history.options().limit, 3);
        assert!(history.get_history().await.is_empty());
        assert!(errors.list().await.unwrap().is_empty());
    }
}
