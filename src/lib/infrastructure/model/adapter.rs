//! Message adapters - convert transcript messages and tool descriptors into the
//! OpenAI chat-completion wire format

use crate::types::{ChatMessage, MessageRole, ToolDescriptor};
use serde_json::{Map as JsonMap, Value, json};
use std::collections::HashSet;

/// Adapter for converting messages to the OpenAI-compatible format
pub struct MessageAdapter;

impl MessageAdapter {
    /// Returns: [{"role": "...", "content": "...", ...}]
    ///
    /// Assistant tool calls without a later `tool` message carrying their id
    /// are left out; an assistant message with none answered is sent as plain
    /// text.
    pub fn to_openai_format(messages: &[ChatMessage]) -> Vec<Value> {
        let mut answered: HashSet<&str> = HashSet::new();
        let mut wire: Vec<Value> = messages
            .iter()
            .rev()
            .map(|message| {
                let value = Self::message_to_openai(message, &answered);
                if message.role == MessageRole::Tool {
                    if let Some(id) = &message.tool_call_id {
                        answered.insert(id.as_str());
                    }
                }
                value
            })
            .collect();
        wire.reverse();
        wire
    }

    pub fn tools_to_openai_format(tools: &[ToolDescriptor]) -> Vec<Value> {
        tools.iter().map(ToolDescriptor::to_function_schema).collect()
    }

    fn message_to_openai(message: &ChatMessage, answered: &HashSet<&str>) -> Value {
        let mut object = JsonMap::new();
        object.insert("role".into(), Value::String(message.role.as_str().into()));

        let answered_calls: Vec<_> = message
            .tool_calls
            .iter()
            .filter(|call| answered.contains(call.id.as_str()))
            .collect();

        match message.role {
            MessageRole::Assistant if !answered_calls.is_empty() => {
                let content = if message.content.is_empty() {
                    Value::Null
                } else {
                    Value::String(message.content.clone())
                };
                object.insert("content".into(), content);
                let calls = answered_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments,
                            }
                        })
                    })
                    .collect();
                object.insert("tool_calls".into(), Value::Array(calls));
            }
            MessageRole::Tool => {
                object.insert("content".into(), Value::String(message.content.clone()));
                if let Some(name) = &message.tool_name {
                    object.insert("name".into(), Value::String(name.clone()));
                }
                if let Some(id) = &message.tool_call_id {
                    object.insert("tool_call_id".into(), Value::String(id.clone()));
                }
            }
            _ => {
                object.insert("content".into(), Value::String(message.content.clone()));
            }
        }

        Value::Object(object)
    }
}
