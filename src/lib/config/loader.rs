use super::app::{AppConfig, ConversationConfig, LoggingConfig};
use super::error::ConfigError;
use super::pipeline::{AnalysisConfig, CrawlConfig};
use super::provider::{ProviderConfig, RawProviderConfig};
use super::server::{LaunchConfig, RawServer, ServerConfig, expand};
use crate::constants::{CONFIG_PATH, ENV_PATH};
use dotenvy::{dotenv, from_filename};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::debug;

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(super) struct RawConfig {
    provider: RawProviderConfig,
    conversation: ConversationConfig,
    launch: LaunchConfig,
    servers: Vec<RawServer>,
    logging: LoggingConfig,
    crawl: CrawlConfig,
    analysis: AnalysisConfig,
}

/// Ensures environment variables are loaded from config/.env (then ./.env)
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
        let _ = dotenv();
    });
}

/// Load and validate configuration.
///
/// An explicit path must exist. Without one, `config/client.toml` is used when
/// present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    match path {
        Some(path) => read_config(path),
        None => {
            let default_path = Path::new(CONFIG_PATH);
            if default_path.exists() {
                read_config(default_path)
            } else {
                debug!(path = CONFIG_PATH, "No configuration file, using defaults");
                validate_and_build(RawConfig::default())
            }
        }
    }
}

/// Parse configuration from a TOML string.
pub fn parse_config(content: &str, origin: &Path) -> Result<AppConfig, ConfigError> {
    let parsed: RawConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;
    validate_and_build(parsed)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading client configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_config(&content, path)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let provider = ProviderConfig::from(parsed.provider);
    provider.validate()?;

    let conversation = parsed.conversation;
    if conversation.max_turns == 0 {
        return Err(ConfigError::invalid(
            "conversation.max_turns",
            "must be at least 1",
        ));
    }
    let conversation = ConversationConfig {
        final_tool: conversation
            .final_tool
            .filter(|name| !name.trim().is_empty()),
        ..conversation
    };

    let crawl = parsed.crawl.expanded();
    if crawl.command.is_empty() {
        return Err(ConfigError::invalid("crawl.command", "must not be empty"));
    }
    if parsed.analysis.max_rows == 0 {
        return Err(ConfigError::invalid("analysis.max_rows", "must be at least 1"));
    }

    let mut logging = parsed.logging;
    logging.dir = PathBuf::from(expand(&logging.dir.to_string_lossy()));

    Ok(AppConfig {
        provider,
        conversation,
        launch: parsed.launch,
        servers: parsed.servers.into_iter().map(ServerConfig::from).collect(),
        logging,
        crawl,
        analysis: parsed.analysis,
    })
}
