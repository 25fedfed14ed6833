//! `start_crawler`: refresh the spider's date window, run it, report the CSV.

mod error;
mod runner;
mod settings;

pub use error::CrawlError;
pub use runner::{CrawlOutcome, CrawlRunner};
pub use settings::{patch_dates, update_settings, yesterday};

use crate::config::CrawlConfig;
use crate::infrastructure::rpc::{ToolCatalog, ToolError, ToolHandler};
use crate::types::{ToolDescriptor, empty_object_schema};
use async_trait::async_trait;
use chrono::Local;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

pub const TOOL_NAME: &str = "start_crawler";
pub const SERVER_NAME: &str = "CrawlerServer";

pub struct StartCrawlerTool {
    config: CrawlConfig,
    log_dir: PathBuf,
}

impl StartCrawlerTool {
    pub fn new(config: CrawlConfig, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            log_dir: log_dir.into(),
        }
    }

    async fn crawl(&self) -> Result<CrawlOutcome, CrawlError> {
        update_settings(&self.config.settings_path(), yesterday())?;

        fs::create_dir_all(&self.log_dir).map_err(|e| CrawlError::io(&self.log_dir, e))?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let log_file = self.log_dir.join(format!("crawl_{stamp}.log"));

        let runner = CrawlRunner {
            command: self.config.command.clone(),
            workdir: self.config.crawl_dir(),
            timeout: self.config.timeout(),
            grace: self.config.grace(),
        };
        runner.run(&log_file).await
    }
}

#[async_trait]
impl ToolHandler for StartCrawlerTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            TOOL_NAME,
            "调用本地的爬虫服务获取微博平台当天的企业相关舆情信息。返回爬虫状态 status 和结果 csv 文件路径 result_file_path。",
            empty_object_schema(),
        )
    }

    async fn call(&self, _arguments: Value) -> Result<Value, ToolError> {
        match self.crawl().await {
            Ok(outcome) if outcome.succeeded() => {
                let result_file = self.config.result_path();
                info!(result = %result_file.display(), "crawl succeeded");
                Ok(json!({
                    "status": "success",
                    "result_file_path": result_file.display().to_string(),
                }))
            }
            Ok(outcome) => {
                let reason = if outcome.timed_out {
                    format!("crawler timed out after {} s", self.config.timeout_secs)
                } else {
                    match outcome.exit_code {
                        Some(code) => format!("crawler exited with status {code}"),
                        None => "crawler was stopped by a signal".to_string(),
                    }
                };
                error!(%reason, "crawl failed");
                Ok(json!({
                    "status": "failed",
                    "error": reason,
                    "log_file": outcome.log_file.display().to_string(),
                }))
            }
            Err(err) => {
                error!(%err, "crawl failed");
                Ok(json!({ "status": "failed", "error": err.to_string() }))
            }
        }
    }
}

/// Catalog served by the `crawl-server` binary.
pub fn catalog(config: CrawlConfig, log_dir: impl Into<PathBuf>) -> ToolCatalog {
    ToolCatalog::new(SERVER_NAME).with_tool(Arc::new(StartCrawlerTool::new(config, log_dir)))
}
