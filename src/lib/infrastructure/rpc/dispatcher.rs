//! Routes MCP methods to a [`ToolCatalog`].

use super::catalog::{ToolCatalog, ToolError};
use super::types::{RpcRequest, RpcResponse};
use crate::constants::MCP_PROTOCOL_VERSION;
use serde_json::{Map as JsonMap, Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct McpDispatcher {
    catalog: Arc<ToolCatalog>,
}

impl McpDispatcher {
    pub fn new(catalog: ToolCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    /// Handle one raw inbound line. Returns the encoded response, if any.
    pub async fn handle_text(&self, raw: &str) -> Option<String> {
        let response = match serde_json::from_str::<Value>(raw) {
            Ok(value) => self.handle_value(value).await?,
            Err(err) => {
                warn!(%err, "Received invalid JSON");
                RpcResponse::parse_error(format!("invalid JSON: {err}"))
            }
        };
        serde_json::to_string(&response).ok()
    }

    /// Handle one decoded message. Notifications and stray responses yield `None`.
    pub async fn handle_value(&self, value: Value) -> Option<RpcResponse> {
        if value.get("method").is_none() {
            debug!("Ignoring message without method");
            return None;
        }
        let id = value.get("id").cloned();
        match serde_json::from_value::<RpcRequest>(value) {
            Ok(request) => self.handle(request).await,
            Err(err) => Some(RpcResponse::invalid_request(id, err.to_string())),
        }
    }

    pub async fn handle(&self, request: RpcRequest) -> Option<RpcResponse> {
        debug!(method = %request.method, "Received JSON-RPC request");

        if request.jsonrpc != "2.0" {
            return Some(RpcResponse::invalid_request(
                request.id.clone(),
                "Unsupported jsonrpc version (expected 2.0)",
            ));
        }

        if request.is_notification() {
            debug!(method = %request.method, "Received notification");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request),
            "ping" => RpcResponse::success(request.id.clone(), json!({})),
            "tools/list" => self.handle_tool_list(&request),
            "tools/call" => self.handle_tool_call(&request).await,
            other => {
                error!(method = other, "Unknown JSON-RPC method");
                RpcResponse::method_not_found(request.id.clone(), other)
            }
        };
        Some(response)
    }

    fn handle_initialize(&self, request: &RpcRequest) -> RpcResponse {
        let requested = request
            .params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or(MCP_PROTOCOL_VERSION);
        info!(
            server = self.catalog.name(),
            protocol = requested,
            "Client initialised session"
        );

        let mut result = JsonMap::new();
        result.insert("protocolVersion".into(), Value::String(requested.into()));
        result.insert(
            "capabilities".into(),
            json!({ "tools": { "listChanged": false } }),
        );
        result.insert(
            "serverInfo".into(),
            json!({ "name": self.catalog.name(), "version": self.catalog.version() }),
        );
        if let Some(instructions) = self.catalog.instructions() {
            result.insert("instructions".into(), Value::String(instructions.into()));
        }
        RpcResponse::success(request.id.clone(), Value::Object(result))
    }

    fn handle_tool_list(&self, request: &RpcRequest) -> RpcResponse {
        let tools: Vec<Value> = self
            .catalog
            .descriptors()
            .iter()
            .filter_map(|descriptor| serde_json::to_value(descriptor).ok())
            .collect();
        RpcResponse::success(request.id.clone(), json!({ "tools": tools }))
    }

    async fn handle_tool_call(&self, request: &RpcRequest) -> RpcResponse {
        let Some(Value::Object(params)) = &request.params else {
            return RpcResponse::invalid_params(
                request.id.clone(),
                "params must be an object with name",
            );
        };
        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return RpcResponse::invalid_params(
                request.id.clone(),
                "params.name must be a string",
            );
        };
        let Some(handler) = self.catalog.get(name) else {
            warn!(tool = name, "Call for unknown tool");
            return RpcResponse::invalid_params(request.id.clone(), format!("Unknown tool: {name}"));
        };

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Value::Object(JsonMap::new()),
            Some(other) => other.clone(),
        };

        info!(tool = name, "Calling tool");
        match handler.call(arguments).await {
            Ok(value) => RpcResponse::success(request.id.clone(), tool_result(&value, false)),
            Err(ToolError::InvalidArguments(reason)) => {
                warn!(tool = name, %reason, "Rejected tool arguments");
                RpcResponse::invalid_params(request.id.clone(), reason)
            }
            Err(ToolError::Failed(reason)) => {
                error!(tool = name, %reason, "Tool call failed");
                RpcResponse::success(
                    request.id.clone(),
                    tool_result(&Value::String(reason), true),
                )
            }
        }
    }
}

fn tool_result(value: &Value, is_error: bool) -> Value {
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let mut result = JsonMap::new();
    result.insert(
        "content".into(),
        json!([{ "type": "text", "text": text }]),
    );
    if value.is_object() {
        result.insert("structuredContent".into(), value.clone());
    }
    result.insert("isError".into(), Value::Bool(is_error));
    Value::Object(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::rpc::catalog::ToolHandler;
    use crate::types::{ToolDescriptor, empty_object_schema};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        fn descriptor(&self) -> ToolDescriptor {
            ToolDescriptor::new("echo", "Echo the value back", empty_object_schema())
        }

        async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
            match arguments.get("value").and_then(Value::as_str) {
                Some("boom") => Err(ToolError::Failed("exploded".into())),
                Some(value) => Ok(json!({ "value": value })),
                None => Err(ToolError::InvalidArguments("value is required".into())),
            }
        }
    }

    fn dispatcher() -> McpDispatcher {
        McpDispatcher::new(
            ToolCatalog::new("test-server")
                .with_instructions("Echo things")
                .with_tool(Arc::new(Echo)),
        )
    }

    async fn call(value: Value) -> Value {
        dispatcher()
            .handle_value(value)
            .await
            .expect("response")
            .to_value()
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {"protocolVersion": "2025-06-18", "capabilities": {}}
        }))
        .await;
        assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
        assert_eq!(response["result"]["serverInfo"]["name"], "test-server");
        assert_eq!(response["result"]["instructions"], "Echo things");
        assert_eq!(response["id"], 1);
    }

    #[tokio::test]
    async fn tools_list_uses_mcp_field_names() {
        let response = call(json!({"jsonrpc": "2.0", "id": "a", "method": "tools/list"})).await;
        let tools = response["result"]["tools"].as_array().expect("tools");
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
    }

    #[tokio::test]
    async fn tool_results_carry_text_and_structured_content() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": {"name": "echo", "arguments": {"value": "X"}}
        }))
        .await;
        let result = &response["result"];
        assert_eq!(result["isError"], false);
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], r#"{"value":"X"}"#);
        assert_eq!(result["structuredContent"]["value"], "X");
    }

    #[tokio::test]
    async fn handler_failures_become_error_results() {
        let response = call(json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "echo", "arguments": {"value": "boom"}}
        }))
        .await;
        assert_eq!(response["result"]["isError"], true);
        assert_eq!(response["result"]["content"][0]["text"], "exploded");
    }

    #[tokio::test]
    async fn bad_arguments_and_unknown_tools_are_invalid_params() {
        let missing = call(json!({
            "jsonrpc": "2.0", "id": 4, "method": "tools/call",
            "params": {"name": "echo"}
        }))
        .await;
        assert_eq!(missing["error"]["code"], -32602);

        let unknown = call(json!({
            "jsonrpc": "2.0", "id": 5, "method": "tools/call",
            "params": {"name": "nope", "arguments": {}}
        }))
        .await;
        assert_eq!(unknown["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn unknown_methods_and_versions_are_rejected() {
        let unknown = call(json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"})).await;
        assert_eq!(unknown["error"]["code"], -32601);

        let version = call(json!({"jsonrpc": "1.0", "id": 7, "method": "ping"})).await;
        assert_eq!(version["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let reply = dispatcher()
            .handle_value(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn malformed_lines_get_parse_errors() {
        let reply = dispatcher().handle_text("{not json").await.expect("reply");
        let value: Value = serde_json::from_str(&reply).expect("json");
        assert_eq!(value["error"]["code"], -32700);
    }
}
