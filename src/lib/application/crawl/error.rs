use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("settings file not found: {}", path.display())]
    SettingsNotFound { path: PathBuf },
    #[error("no {0} assignment found in settings file")]
    MissingAssignment(&'static str),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("crawl command is empty")]
    EmptyCommand,
    #[error("failed to start crawler '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl CrawlError {
    pub(super) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
