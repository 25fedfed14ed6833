//! Per-post classification: every post is asked the same four yes/no
//! questions inside one growing conversation.

use super::error::AnalysisError;
use crate::config::AnalysisConfig;
use crate::infrastructure::model::{ChatModel, CompletionRequest};
use crate::types::ChatMessage;
use std::path::Path;
use tracing::{debug, info, warn};

pub const OUTPUT_HEADERS: [&str; 3] = ["微博正文", "思考过程", "模型回复"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifySummary {
    pub classified: usize,
    pub skipped: usize,
}

pub struct PostClassifier<'a, M: ChatModel> {
    model: &'a M,
    config: &'a AnalysisConfig,
}

impl<'a, M: ChatModel> PostClassifier<'a, M> {
    pub fn new(model: &'a M, config: &'a AnalysisConfig) -> Self {
        Self { model, config }
    }

    /// Classify up to `max_rows` posts from `input` and write
    /// `{post, reasoning, reply}` rows to `output`.
    pub async fn classify_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<ClassifySummary, AnalysisError> {
        let posts = self.read_posts(input)?;
        info!(
            input = %input.display(),
            posts = posts.len(),
            "classifying posts"
        );

        let mut writer = csv::Writer::from_path(output).map_err(|e| AnalysisError::csv(output, e))?;
        writer
            .write_record(OUTPUT_HEADERS)
            .map_err(|e| AnalysisError::csv(output, e))?;

        let mut messages = vec![
            ChatMessage::system(self.config.classifier_system_prompt.clone()),
            ChatMessage::user(self.config.classification_prompt()),
        ];
        let mut summary = ClassifySummary::default();

        for (index, post) in posts.iter().enumerate() {
            messages.push(ChatMessage::user(post.clone()));
            let request = CompletionRequest::new(self.config.model.clone(), messages.clone());
            match self.model.complete_streaming(request).await {
                Ok(reply) => {
                    debug!(row = index + 1, reply = reply.content.as_str(), "post classified");
                    writer
                        .write_record([post.as_str(), reply.reasoning.as_str(), reply.content.as_str()])
                        .map_err(|e| AnalysisError::csv(output, e))?;
                    messages.push(ChatMessage::assistant(reply.content));
                    summary.classified += 1;
                }
                Err(err) => {
                    warn!(row = index + 1, %err, "failed to classify post, skipping");
                    messages.pop();
                    summary.skipped += 1;
                }
            }
        }

        writer
            .flush()
            .map_err(|e| AnalysisError::csv(output, csv::Error::from(e)))?;
        info!(
            classified = summary.classified,
            skipped = summary.skipped,
            output = %output.display(),
            "classification finished"
        );
        Ok(summary)
    }

    fn read_posts(&self, input: &Path) -> Result<Vec<String>, AnalysisError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(input)
            .map_err(|e| AnalysisError::csv(input, e))?;
        let headers = reader
            .headers()
            .map_err(|e| AnalysisError::csv(input, e))?
            .clone();
        let column = headers
            .iter()
            .position(|name| name.trim_start_matches('\u{feff}').trim() == self.config.text_column)
            .ok_or_else(|| AnalysisError::MissingColumn {
                column: self.config.text_column.clone(),
                path: input.to_path_buf(),
            })?;

        let mut posts = Vec::new();
        for (index, record) in reader.records().enumerate() {
            if posts.len() == self.config.max_rows {
                break;
            }
            match record {
                Ok(record) => match record.get(column) {
                    Some(text) if !text.trim().is_empty() => posts.push(text.to_string()),
                    _ => debug!(row = index + 1, "row has no post text"),
                },
                Err(err) => warn!(row = index + 1, %err, "unreadable CSV row, skipping"),
            }
        }
        Ok(posts)
    }
}
