use super::errors::ConversationError;
use super::registry::ToolRegistry;
use super::transcript::Transcript;
use crate::application::tooling::{ToolResult, ToolSession};
use crate::config::{ConversationConfig, ProviderConfig};
use crate::infrastructure::model::{ChatModel, CompletionRequest};
use crate::types::{ChatMessage, ToolCall};
use serde_json::{Map as JsonMap, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ConversationOptions {
    pub model: String,
    pub system_prompt: String,
    /// Tool whose result ends the turn instead of going back to the model.
    pub final_tool: Option<String>,
    pub max_turns: usize,
}

impl ConversationOptions {
    pub fn from_config(conversation: &ConversationConfig, provider: &ProviderConfig) -> Self {
        Self {
            model: provider.model.clone(),
            system_prompt: conversation.system_prompt.clone(),
            final_tool: conversation.final_tool.clone(),
            max_turns: conversation.max_turns,
        }
    }
}

pub struct Conversation<M: ChatModel> {
    model: M,
    sessions: Vec<Arc<dyn ToolSession>>,
    registry: ToolRegistry,
    transcript: Transcript,
    options: ConversationOptions,
}

impl<M: ChatModel> Conversation<M> {
    /// Build the tool registry from `sessions`. Fails as a whole if any
    /// session cannot list its tools.
    pub async fn connect(
        model: M,
        sessions: Vec<Arc<dyn ToolSession>>,
        options: ConversationOptions,
    ) -> Result<Self, ConversationError> {
        let registry = ToolRegistry::connect(&sessions).await?;
        if registry.is_empty() {
            warn!(
                sessions = sessions.len(),
                "No tools registered, the model can only reply in text"
            );
        }
        info!(
            sessions = sessions.len(),
            tools = registry.descriptors().len(),
            final_tool = options.final_tool.as_deref(),
            "Conversation connected"
        );
        Ok(Self {
            model,
            sessions,
            registry,
            transcript: Transcript::new(),
            options,
        })
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one user query to completion. `Ok(None)` means the model ended the
    /// turn with an empty reply and no tool call.
    pub async fn process_query(&mut self, query: &str) -> Result<Option<String>, ConversationError> {
        if self.transcript.is_empty() {
            self.transcript
                .push(ChatMessage::system(self.options.system_prompt.clone()));
        }
        self.transcript.push(ChatMessage::user(query));
        info!(query_chars = query.chars().count(), "Processing query");

        for turn in 1..=self.options.max_turns {
            let request = CompletionRequest::new(
                self.options.model.clone(),
                self.transcript.messages().to_vec(),
            )
            .with_tools(self.registry.descriptors().to_vec());

            debug!(turn, messages = request.messages.len(), "Submitting turn to model");
            let reply = self.model.complete(request).await?;
            let call = reply.first_tool_call().cloned();
            let has_content = reply.has_content();
            if reply.tool_calls.len() > 1 {
                debug!(
                    requested = reply.tool_calls.len(),
                    "Model requested several tool calls, running the first"
                );
            }
            self.transcript.push(reply);

            let Some(call) = call else {
                if has_content {
                    debug!(turn, "Model replied with text, continuing");
                    continue;
                }
                info!(turn, "Model ended the turn without an answer");
                return Ok(None);
            };

            let session = self
                .registry
                .resolve(&call.name)
                .cloned()
                .ok_or_else(|| {
                    warn!(tool = call.name.as_str(), "Model requested unknown tool");
                    ConversationError::ToolNotFound(call.name.clone())
                })?;
            let arguments = parse_arguments(&call)?;

            info!(tool = call.name.as_str(), server = session.name(), "Calling tool");
            let result = session.call_tool(&call.name, arguments).await?;

            if self.options.final_tool.as_deref() == Some(call.name.as_str()) {
                let answer = decode_final_answer(&call.name, &result)?;
                info!(tool = call.name.as_str(), "Final tool produced the answer");
                return Ok(Some(answer));
            }

            self.transcript.push(ChatMessage::tool(
                call.name.clone(),
                Some(call.id.clone()),
                result.transcript_content(),
            ));
        }

        warn!(max_turns = self.options.max_turns, "Turn ceiling reached");
        Err(ConversationError::MaxTurnsExceeded(self.options.max_turns))
    }

    /// Close every tool session.
    pub async fn close(&self) {
        for session in &self.sessions {
            session.close().await;
        }
    }
}

fn parse_arguments(call: &ToolCall) -> Result<Value, ConversationError> {
    let raw = call.arguments.trim();
    if raw.is_empty() {
        return Ok(Value::Object(JsonMap::new()));
    }
    serde_json::from_str(raw).map_err(|source| ConversationError::InvalidArguments {
        tool: call.name.clone(),
        source,
    })
}

/// The final tool reports JSON with a `summary` field; a `failed` status is an
/// error. Anything that is not a JSON object is taken as the answer verbatim.
fn decode_final_answer(tool: &str, result: &ToolResult) -> Result<String, ConversationError> {
    let text = result.transcript_content();
    if result.is_error() {
        return Err(ConversationError::FinalToolFailed {
            tool: tool.to_string(),
            reason: text,
        });
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(payload)) => {
            if payload.get("status").and_then(Value::as_str) == Some("failed") {
                let reason = payload
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or(text);
                return Err(ConversationError::FinalToolFailed {
                    tool: tool.to_string(),
                    reason,
                });
            }
            match payload.get("summary").and_then(Value::as_str) {
                Some(summary) => Ok(summary.to_string()),
                None => Ok(text),
            }
        }
        Ok(Value::String(answer)) => Ok(answer),
        _ => Ok(text),
    }
}
