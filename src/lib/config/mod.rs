pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod provider;
pub mod server;

pub use crate::constants::CONFIG_PATH;

pub use app::{AppConfig, ConversationConfig, LoggingConfig};
pub use error::ConfigError;
pub use pipeline::{AnalysisConfig, CrawlConfig};
pub use provider::ProviderConfig;
pub use server::{LaunchConfig, ServerConfig};
