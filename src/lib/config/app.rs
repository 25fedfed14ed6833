use super::defaults::{
    DEFAULT_FINAL_TOOL, DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL, DEFAULT_MAX_TURNS,
    DEFAULT_SYSTEM_PROMPT,
};
use super::error::ConfigError;
use super::pipeline::{AnalysisConfig, CrawlConfig};
use super::provider::ProviderConfig;
use super::server::{LaunchConfig, ServerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration loaded from client.toml
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub conversation: ConversationConfig,
    pub launch: LaunchConfig,
    pub servers: Vec<ServerConfig>,
    pub logging: LoggingConfig,
    pub crawl: CrawlConfig,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Provider settings the analysis server talks to.
    pub fn analysis_provider(&self) -> ProviderConfig {
        self.provider
            .with_overrides(&self.analysis.model, self.analysis.api_key.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub system_prompt: String,
    /// Tool whose result ends the conversation instead of feeding the model.
    pub final_tool: Option<String>,
    pub max_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            final_tool: Some(DEFAULT_FINAL_TOOL.to_string()),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_LOG_DIR),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}
