//! Tools a server exposes over MCP.

use crate::types::ToolDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// Reported to the caller as a JSON-RPC `invalid params` error.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Reported as a tool result with `isError: true`.
    #[error("{0}")]
    Failed(String),
}

/// One callable tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn call(&self, arguments: Value) -> Result<Value, ToolError>;
}

#[derive(Clone)]
pub struct ToolCatalog {
    name: String,
    version: String,
    instructions: Option<String>,
    handlers: Vec<Arc<dyn ToolHandler>>,
}

impl ToolCatalog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
            handlers: Vec::new(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn with_tool(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.handlers.iter().map(|h| h.descriptor()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.iter().find(|h| h.descriptor().name == name)
    }
}
