use crate::application::tooling::ToolInvokeError;
use crate::infrastructure::model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Tool(#[from] ToolInvokeError),
    #[error("model requested unknown tool '{0}'")]
    ToolNotFound(String),
    #[error("arguments for tool '{tool}' are not valid JSON: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("final tool '{tool}' failed: {reason}")]
    FinalToolFailed { tool: String, reason: String },
    #[error("no final answer after {0} model turns")]
    MaxTurnsExceeded(usize),
}

impl ConversationError {
    pub fn user_message(&self) -> String {
        match self {
            ConversationError::Model(err) => err.user_message(),
            ConversationError::Tool(err) => format!("Tool provider error: {err}"),
            ConversationError::ToolNotFound(name) => {
                format!("The model asked for tool \"{name}\", which no provider offers.")
            }
            ConversationError::InvalidArguments { tool, .. } => {
                format!("The model sent malformed arguments for tool \"{tool}\".")
            }
            ConversationError::FinalToolFailed { tool, reason } => {
                format!("\"{tool}\" could not produce the brief: {reason}")
            }
            ConversationError::MaxTurnsExceeded(turns) => {
                format!("Gave up after {turns} model turns without a final answer.")
            }
        }
    }
}
