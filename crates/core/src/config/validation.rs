//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AiConfig, AiProvider, AppConfig};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `history_limit` is 0 or exceeds 500
    /// - `error_log_limit` is 0 or exceeds 10000
    /// - `sync_item_quota_bytes` is 0
    /// - the `ai` section is invalid (see [`AiConfig::validate`])
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(invalid("history_limit", "must be greater than 0"));
        }
        if self.history_limit > 500 {
            return Err(invalid("history_limit", "must not exceed 500"));
        }

        if self.error_log_limit == 0 {
            return Err(invalid("error_log_limit", "must be greater than 0"));
        }
        if self.error_log_limit > 10_000 {
            return Err(invalid("error_log_limit", "must not exceed 10000"));
        }

        if self.sync_item_quota_bytes == Some(0) {
            return Err(invalid("sync_item_quota_bytes", "must be greater than 0 when set"));
        }

        if let Some(ai) = &self.ai {
            ai.validate()?;
        }

        Ok(())
    }
}

impl AiConfig {
    /// Validate the AI backend settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `api_key` is empty
    /// - no endpoint is set for a custom provider, or it is not an http(s) URL
    /// - no model is set for a custom provider
    /// - `max_tokens` is outside 100..=4000
    /// - `temperature` is outside 0..=2
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(invalid("ai.api_key", "must not be empty"));
        }

        let Some(endpoint) = self.endpoint_url() else {
            return Err(invalid("ai.endpoint", "required for the custom provider"));
        };
        match url::Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(invalid("ai.endpoint", "must be an http(s) URL")),
        }

        if self.model_name().is_none() {
            return Err(invalid("ai.model", "required for the custom provider"));
        }

        if !(100..=4000).contains(&self.max_tokens) {
            return Err(invalid("ai.max_tokens", "must be between 100 and 4000"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid("ai.temperature", "must be between 0 and 2"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("ai.timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("ai.timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.provider == AiProvider::OpenAi && !self.api_key.starts_with("sk-") {
            tracing::warn!("ai.api_key does not look like an OpenAI key (expected sk- prefix)");
        }
        if self.provider == AiProvider::Anthropic && !self.api_key.starts_with("sk-ant-") {
            tracing::warn!("ai.api_key does not look like an Anthropic key (expected sk-ant- prefix)");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai() -> AiConfig {
        AiConfig { api_key: "sk-test".into(), ..Default::default() }
    }

    fn field_of(result: Result<(), ConfigError>) -> Option<String> {
        match result {
            Err(ConfigError::Invalid { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_history_limit() {
        let config = AppConfig { history_limit: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("history_limit"));

        let config = AppConfig { history_limit: 501, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("history_limit"));

        let config = AppConfig { history_limit: 1, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_error_log_limit() {
        let config = AppConfig { error_log_limit: 0, ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("error_log_limit"));
    }

    #[test]
    fn test_validate_zero_quota() {
        let config = AppConfig { sync_item_quota_bytes: Some(0), ..Default::default() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("sync_item_quota_bytes"));
    }

    #[test]
    fn test_validate_ai_ok() {
        assert!(ai().validate().is_ok());
        let config = AppConfig { ai: Some(ai()), ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ai_missing_key() {
        let config = AiConfig::default();
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.api_key"));
    }

    #[test]
    fn test_validate_custom_provider_needs_endpoint_and_model() {
        let config = AiConfig { provider: AiProvider::Custom, ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.endpoint"));

        let config = AiConfig { provider: AiProvider::Custom, endpoint: Some("https://llm.local/v1".into()), ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.model"));

        let config = AiConfig { endpoint: Some("ftp://llm.local".into()), ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.endpoint"));
    }

    #[test]
    fn test_validate_ai_ranges() {
        let config = AiConfig { max_tokens: 99, ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.max_tokens"));

        let config = AiConfig { max_tokens: 4001, ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.max_tokens"));

        let config = AiConfig { temperature: 2.5, ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.temperature"));

        let config = AiConfig { temperature: 0.0, max_tokens: 4000, ..ai() };
        assert!(config.validate().is_ok());

        let config = AiConfig { timeout_ms: 50, ..ai() };
        assert_eq!(field_of(config.validate()).as_deref(), Some("ai.timeout_ms"));
    }
}
