//! `wb_analysis_tool`: classify crawled posts, then condense the
//! classifications into a short brief.

mod classifier;
mod error;
mod report;

#[cfg(test)]
pub(crate) mod test_support;

pub use classifier::{ClassifySummary, OUTPUT_HEADERS, PostClassifier};
pub use error::AnalysisError;
pub use report::{output_path, render_report};

use crate::config::AnalysisConfig;
use crate::infrastructure::model::{ChatModel, CompletionRequest};
use crate::infrastructure::rpc::{ToolCatalog, ToolError, ToolHandler};
use crate::types::{ChatMessage, ToolDescriptor};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

pub const TOOL_NAME: &str = "wb_analysis_tool";
pub const SERVER_NAME: &str = "AnalysisServer";

pub struct AnalysisTool<M: ChatModel> {
    model: M,
    config: AnalysisConfig,
    log_file: PathBuf,
}

impl<M: ChatModel> AnalysisTool<M> {
    pub fn new(model: M, config: AnalysisConfig, log_file: impl Into<PathBuf>) -> Self {
        Self {
            model,
            config,
            log_file: log_file.into(),
        }
    }

    /// Classify, render, summarise. Returns the brief.
    pub async fn analyse(&self, input: &Path) -> Result<String, AnalysisError> {
        if !input.exists() {
            return Err(AnalysisError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let output = output_path(input);
        let summary = PostClassifier::new(&self.model, &self.config)
            .classify_file(input, &output)
            .await?;
        if summary.classified == 0 {
            return Err(AnalysisError::NoPosts {
                path: input.to_path_buf(),
            });
        }

        let report = render_report(&output)?;
        let messages = vec![
            ChatMessage::system(self.config.system_prompt.clone()),
            ChatMessage::user(format!("{}\n{}", self.config.summary_prompt(), report)),
        ];
        let request = CompletionRequest::new(self.config.model.clone(), messages);
        let reply = self.model.complete_streaming(request).await?;
        info!(
            reasoning_chars = reply.reasoning.chars().count(),
            brief_chars = reply.content.chars().count(),
            "brief generated"
        );
        Ok(reply.content.trim().to_string())
    }
}

#[async_trait]
impl<M: ChatModel + 'static> ToolHandler for AnalysisTool<M> {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            TOOL_NAME,
            "调用大模型分析 CSV 舆情信息，返回简报文本。",
            json!({
                "type": "object",
                "properties": {
                    "csv_file_path": {
                        "type": "string",
                        "description": "CSV 文件路径",
                    }
                },
                "required": ["csv_file_path"],
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let path = arguments
            .get("csv_file_path")
            .and_then(Value::as_str)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("csv_file_path must be a string".into()))?;

        let log_file = self.log_file.display().to_string();
        match self.analyse(Path::new(path)).await {
            Ok(summary) => Ok(json!({
                "status": "success",
                "summary": summary,
                "log_file": log_file,
            })),
            Err(err) => {
                error!(%err, csv = path, "analysis failed");
                Ok(json!({
                    "status": "failed",
                    "error": err.to_string(),
                    "log_file": log_file,
                }))
            }
        }
    }
}

/// Catalog served by the `analysis-server` binary.
pub fn catalog<M: ChatModel + 'static>(
    model: M,
    config: AnalysisConfig,
    log_file: impl Into<PathBuf>,
) -> ToolCatalog {
    ToolCatalog::new(SERVER_NAME).with_tool(Arc::new(AnalysisTool::new(model, config, log_file)))
}

#[cfg(test)]
mod tests {
    use super::test_support::CannedModel;
    use super::*;
    use std::fs;

    fn input(dir: &Path) -> PathBuf {
        let path = dir.join("东方精工.csv");
        fs::write(&path, "id,微博正文\n1,订单增长\n2,新工厂投产\n").expect("write");
        path
    }

    #[tokio::test]
    async fn successful_analysis_returns_the_brief() {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = input(dir.path());
        let tool = AnalysisTool::new(CannedModel::new(None), AnalysisConfig::default(), "a.log");

        let result = tool
            .call(json!({ "csv_file_path": csv.display().to_string() }))
            .await
            .expect("call");
        assert_eq!(result["status"], "success");
        // two classification calls, then the summary
        assert_eq!(result["summary"], "verdict 3");
        assert_eq!(result["log_file"], "a.log");
        assert!(dir.path().join("东方精工_output.csv").exists());

        let summary_request = tool.model.requests().last().cloned().expect("request");
        assert_eq!(summary_request.messages.len(), 2);
        let prompt = &summary_request.messages[1].content;
        assert!(prompt.contains("300"));
        assert!(prompt.contains("订单增长,reasoning 1,verdict 1"));
    }

    #[tokio::test]
    async fn missing_input_reports_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = AnalysisTool::new(CannedModel::new(None), AnalysisConfig::default(), "a.log");

        let result = tool
            .call(json!({ "csv_file_path": dir.path().join("absent.csv").display().to_string() }))
            .await
            .expect("call");
        assert_eq!(result["status"], "failed");
        assert!(result["error"].as_str().unwrap_or_default().contains("not found"));
        assert!(tool.model.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_argument_is_rejected() {
        let tool = AnalysisTool::new(CannedModel::new(None), AnalysisConfig::default(), "a.log");
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
