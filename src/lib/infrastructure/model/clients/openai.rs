//! OpenAI-compatible client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource, retry::Never};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::base::HttpClientBase;
use super::stream::{StreamAccumulator, StreamProgress};
use crate::config::ProviderConfig;
use crate::infrastructure::model::adapter::MessageAdapter;
use crate::infrastructure::model::traits::ChatModel;
use crate::infrastructure::model::types::{CompletionRequest, ModelError, StreamedReply};
use crate::types::{ChatMessage, ToolCall};

/// OpenAI-compatible client (DashScope compatible mode, OpenAI, vLLM, etc.)
#[derive(Clone)]
pub struct OpenAIClient {
    base: HttpClientBase,
    api_path: String,
}

impl OpenAIClient {
    pub fn new(config: &ProviderConfig, api_key: String) -> Self {
        Self {
            base: HttpClientBase::new(config.id.clone(), config.endpoint.clone(), Some(api_key)),
            api_path: config.api_path.clone(),
        }
    }

    /// Resolve the key from the environment, then build the client.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, crate::config::ConfigError> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(config, api_key))
    }

    pub fn id(&self) -> &str {
        &self.base.id
    }

    fn payload(&self, request: &CompletionRequest, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: request.model.clone(),
            messages: MessageAdapter::to_openai_format(&request.messages),
            tools: MessageAdapter::tools_to_openai_format(&request.tools),
            stream,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.payload(&request, false);

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending request to OpenAI-compatible provider"
        );

        let response: OpenAIResponse = self.base.post_with_bearer(&url, &payload).await?;
        debug!("Received response from OpenAI-compatible provider");

        let message = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .ok_or_else(|| ModelError::invalid_response(&self.base.id, "missing message"))?;

        let tool_calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(index, call)| ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{index}")),
                name: call.function.name,
                arguments: arguments_to_string(call.function.arguments),
            })
            .collect();

        Ok(ChatMessage::assistant(message.content.unwrap_or_default()).with_tool_calls(tool_calls))
    }

    async fn complete_streaming(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamedReply, ModelError> {
        let url = self.base.build_url(&self.api_path);
        let payload = self.payload(&request, true);
        let builder = self.base.bearer_request(&url, &payload)?;

        info!(
            provider = self.base.id.as_str(),
            model = request.model.as_str(),
            messages = request.messages.len(),
            "Opening completion stream"
        );

        let mut source = EventSource::new(builder)
            .map_err(|err| ModelError::stream(&self.base.id, err.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        let mut accumulator = StreamAccumulator::default();
        while let Some(event) = source.next().await {
            match event {
                Ok(Event::Open) => debug!("Completion stream opened"),
                Ok(Event::Message(message)) => {
                    let progress = accumulator
                        .push(&message.data)
                        .map_err(|reason| ModelError::stream(&self.base.id, reason))?;
                    if progress == StreamProgress::Done {
                        break;
                    }
                }
                Err(EventSourceError::StreamEnded) => break,
                Err(EventSourceError::InvalidStatusCode(status, _)) => {
                    source.close();
                    warn!(
                        provider = self.base.id.as_str(),
                        status = status.as_u16(),
                        "Completion stream rejected"
                    );
                    return Err(ModelError::stream(
                        &self.base.id,
                        format!("unexpected status {status}"),
                    ));
                }
                Err(err) => {
                    source.close();
                    return Err(ModelError::stream(&self.base.id, err.to_string()));
                }
            }
        }
        source.close();

        let reply = accumulator.finish();
        debug!(
            reasoning_chars = reply.reasoning.chars().count(),
            content_chars = reply.content.chars().count(),
            "Completion stream finished"
        );
        Ok(reply)
    }
}

fn arguments_to_string(arguments: Value) -> String {
    match arguments {
        Value::String(text) => text,
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Deserialize)]
struct OpenAIToolCall {
    #[serde(default)]
    id: Option<String>,
    function: OpenAIFunction,
}

#[derive(Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_arguments_are_serialized() {
        let args = serde_json::json!({"csv_file_path": "a.csv"});
        assert_eq!(arguments_to_string(args), r#"{"csv_file_path":"a.csv"}"#);
        assert_eq!(arguments_to_string(Value::Null), "{}");
        assert_eq!(arguments_to_string(Value::String("{}".into())), "{}");
    }

    #[test]
    fn tool_call_response_parses_without_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null,
            "tool_calls":[{"id":"c1","type":"function",
            "function":{"name":"start_crawler","arguments":"{}"}}]}}]}"#;
        let response: OpenAIResponse = serde_json::from_str(body).expect("parse");
        let message = response.choices[0].message.as_ref().expect("message");
        assert!(message.content.is_none());
        let calls = message.tool_calls.as_ref().expect("tool calls");
        assert_eq!(calls[0].function.name, "start_crawler");
    }
}
