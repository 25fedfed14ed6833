//! # Provider Configuration
//!
//! The chat-completion backend used by the client and the analysis server.
//! Any OpenAI-compatible endpoint works; the defaults target DashScope's
//! compatible mode.
//!
//! ```toml
//! [provider]
//! id = "dashscope"
//! endpoint = "https://dashscope.aliyuncs.com/compatible-mode/v1"
//! api_path = "chat/completions"
//! api_key = "QWEN_API_KEY"
//! model = "qwen-plus"
//! ```
//!
//! `api_key` names the environment variable holding the key, never the key
//! itself.

use super::defaults::{
    DEFAULT_API_KEY_ENV, DEFAULT_API_PATH, DEFAULT_ENDPOINT, DEFAULT_MODEL, DEFAULT_PROVIDER_ID,
};
use super::error::ConfigError;
use serde::Deserialize;
use std::env;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub id: String,
    pub endpoint: String,
    pub api_path: String,
    /// Name of the environment variable that holds the API key.
    pub api_key_env: String,
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_PROVIDER_ID.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_path: DEFAULT_API_PATH.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(super) struct RawProviderConfig {
    pub(super) id: Option<String>,
    pub(super) endpoint: Option<String>,
    pub(super) api_path: Option<String>,
    pub(super) api_key: Option<String>,
    pub(super) model: Option<String>,
}

impl From<RawProviderConfig> for ProviderConfig {
    fn from(raw: RawProviderConfig) -> Self {
        let defaults = ProviderConfig::default();
        Self {
            id: raw.id.unwrap_or(defaults.id),
            endpoint: raw.endpoint.unwrap_or(defaults.endpoint),
            api_path: raw.api_path.unwrap_or(defaults.api_path),
            api_key_env: raw.api_key.unwrap_or(defaults.api_key_env),
            model: raw.model.unwrap_or(defaults.model),
        }
    }
}

impl ProviderConfig {
    /// Same backend, different model and (optionally) a different key variable.
    pub fn with_overrides(&self, model: &str, api_key_env: Option<&str>) -> Self {
        Self {
            model: model.to_string(),
            api_key_env: api_key_env
                .map(str::to_string)
                .unwrap_or_else(|| self.api_key_env.clone()),
            ..self.clone()
        }
    }

    /// Read the API key from the environment. A missing or blank variable is
    /// a configuration error.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        let var = self.api_key_env.trim();
        match env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) | Err(_) => {
                warn!(
                    provider = self.id.as_str(),
                    env_var = var,
                    "API key environment variable is not set"
                );
                Err(ConfigError::MissingApiKey {
                    provider: self.id.clone(),
                    env_var: var.to_string(),
                })
            }
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("provider.endpoint", "must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid("provider.model", "must not be empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::invalid(
                "provider.api_key",
                "must name an environment variable",
            ));
        }
        Ok(())
    }
}
