//! Settings for the crawl and analysis tool servers.

use super::defaults::*;
use super::server::expand;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Root the other crawl paths are resolved against.
    pub base_dir: PathBuf,
    /// Scrapy project directory; the crawl command runs here.
    pub project_dir: PathBuf,
    /// Settings file holding `START_DATE` / `END_DATE`, relative to `project_dir`.
    pub settings_file: PathBuf,
    /// CSV the spider writes, relative to `project_dir`.
    pub result_file: PathBuf,
    pub command: Vec<String>,
    pub timeout_secs: u64,
    pub grace_secs: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            project_dir: PathBuf::from(DEFAULT_CRAWL_PROJECT_DIR),
            settings_file: PathBuf::from(DEFAULT_CRAWL_SETTINGS_FILE),
            result_file: PathBuf::from(DEFAULT_CRAWL_RESULT_FILE),
            command: DEFAULT_CRAWL_COMMAND.iter().map(|s| s.to_string()).collect(),
            timeout_secs: DEFAULT_CRAWL_TIMEOUT_SECS,
            grace_secs: DEFAULT_CRAWL_GRACE_SECS,
        }
    }
}

impl CrawlConfig {
    pub fn crawl_dir(&self) -> PathBuf {
        self.base_dir.join(&self.project_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.crawl_dir().join(&self.settings_file)
    }

    pub fn result_path(&self) -> PathBuf {
        self.crawl_dir().join(&self.result_file)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    pub(super) fn expanded(mut self) -> Self {
        let expand_path = |path: &Path| PathBuf::from(expand(&path.to_string_lossy()));
        self.base_dir = expand_path(&self.base_dir);
        self.project_dir = expand_path(&self.project_dir);
        self.settings_file = expand_path(&self.settings_file);
        self.result_file = expand_path(&self.result_file);
        self.command = self.command.iter().map(|part| expand(part)).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub company: String,
    /// Model used for both per-post classification and the brief.
    pub model: String,
    /// Optional separate key variable; falls back to the provider's.
    pub api_key: Option<String>,
    pub max_rows: usize,
    pub text_column: String,
    pub system_prompt: String,
    pub classifier_system_prompt: String,
    pub classification_prompt: String,
    pub summary_prompt: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            company: DEFAULT_COMPANY.to_string(),
            model: DEFAULT_ANALYSIS_MODEL.to_string(),
            api_key: None,
            max_rows: DEFAULT_MAX_ROWS,
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            system_prompt: DEFAULT_ANALYSIS_SYSTEM_PROMPT.to_string(),
            classifier_system_prompt: DEFAULT_CLASSIFIER_SYSTEM_PROMPT.to_string(),
            classification_prompt: DEFAULT_CLASSIFICATION_PROMPT.to_string(),
            summary_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
        }
    }
}

impl AnalysisConfig {
    pub fn classification_prompt(&self) -> String {
        self.classification_prompt.replace("{company}", &self.company)
    }

    pub fn summary_prompt(&self) -> String {
        self.summary_prompt.replace("{company}", &self.company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_paths_are_relative_to_project() {
        let config = CrawlConfig {
            base_dir: PathBuf::from("/srv/brief"),
            ..CrawlConfig::default()
        };
        assert_eq!(config.crawl_dir(), PathBuf::from("/srv/brief/weibo-search"));
        assert_eq!(
            config.settings_path(),
            PathBuf::from("/srv/brief/weibo-search/weibo/settings.py")
        );
        assert!(config.result_path().ends_with("东方精工.csv"));
    }

    #[test]
    fn prompts_substitute_company() {
        let config = AnalysisConfig {
            company: "Acme".into(),
            ..AnalysisConfig::default()
        };
        assert!(config.classification_prompt().contains("Acme"));
        assert!(config.summary_prompt().contains("Acme"));
        assert!(!config.summary_prompt().contains("{company}"));
    }
}
