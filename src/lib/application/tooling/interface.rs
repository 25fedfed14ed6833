use super::error::ToolInvokeError;
use crate::types::ToolDescriptor;
use async_trait::async_trait;
use serde_json::Value;

/// A live connection to one tool provider.
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Label used in logs and collision warnings.
    fn name(&self) -> &str;

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError>;

    async fn call_tool(&self, name: &str, arguments: Value)
    -> Result<ToolResult, ToolInvokeError>;

    async fn close(&self) {}
}

/// Result payload of `tools/call`, kept as the provider sent it.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    raw: Value,
}

impl ToolResult {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Result with a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(serde_json::json!({
            "content": [{ "type": "text", "text": text.into() }],
            "isError": false,
        }))
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn is_error(&self) -> bool {
        self.raw
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn first_text(&self) -> Option<&str> {
        self.raw
            .get("content")
            .and_then(Value::as_array)?
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .find_map(|block| block.get("text").and_then(Value::as_str))
    }

    /// Text fed back into the transcript: the first text block, falling back
    /// to the structured payload and finally the raw result.
    pub fn transcript_content(&self) -> String {
        if let Some(text) = self.first_text() {
            return text.to_string();
        }
        match self.raw.get("structuredContent") {
            Some(structured) => structured.to_string(),
            None => self.raw.to_string(),
        }
    }
}
