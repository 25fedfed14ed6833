//! JSON-RPC client core shared by the stdio and SSE sessions.
//!
//! The transport owns the wire. This type owns request ids, the table of
//! in-flight requests and the MCP handshake.

use super::error::ToolInvokeError;
use super::interface::ToolResult;
use crate::constants::{CLIENT_NAME, MCP_PROTOCOL_VERSION};
use crate::types::ToolDescriptor;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, warn};

type Responder = oneshot::Sender<Result<Value, ToolInvokeError>>;

/// Delivers one encoded JSON-RPC message to the provider.
#[async_trait]
pub(super) trait Outbound: Send + Sync {
    async fn send(&self, message: &Value) -> Result<(), ToolInvokeError>;
}

#[derive(Default)]
struct PendingTable {
    waiters: HashMap<String, Responder>,
    closed: bool,
}

pub(super) struct McpConnection {
    server: String,
    outbound: Box<dyn Outbound>,
    pending: AsyncMutex<PendingTable>,
    id_counter: AtomicU64,
}

impl McpConnection {
    pub(super) fn new(server: impl Into<String>, outbound: Box<dyn Outbound>) -> Self {
        Self {
            server: server.into(),
            outbound,
            pending: AsyncMutex::new(PendingTable::default()),
            id_counter: AtomicU64::new(1),
        }
    }

    pub(super) fn server(&self) -> &str {
        &self.server
    }

    pub(super) async fn initialize(&self) -> Result<(), ToolInvokeError> {
        let params = json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "clientInfo": {
                "name": CLIENT_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {}
        });
        let init_result = self.send_request("initialize", params).await?;
        if let Some(version) = init_result.get("protocolVersion").and_then(Value::as_str) {
            if version != MCP_PROTOCOL_VERSION {
                debug!(
                    server = %self.server,
                    version,
                    "tool provider negotiated a different protocol version"
                );
            }
        }
        if let Some(text) = init_result.get("instructions").and_then(Value::as_str) {
            debug!(server = %self.server, instructions = text, "tool provider instructions");
        }
        self.send_notification("notifications/initialized", json!({}))
            .await
    }

    /// Collect every page of `tools/list`.
    pub(super) async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(cursor) => json!({ "cursor": cursor }),
                None => json!({}),
            };
            let result = self.send_request("tools/list", params).await?;
            if let Some(array) = result.get("tools").and_then(Value::as_array) {
                for tool in array {
                    match serde_json::from_value::<ToolDescriptor>(tool.clone()) {
                        Ok(descriptor) => tools.push(descriptor),
                        Err(source) => {
                            return Err(ToolInvokeError::InvalidJson {
                                server: self.server.clone(),
                                source,
                            });
                        }
                    }
                }
            }
            cursor = result
                .get("nextCursor")
                .and_then(Value::as_str)
                .map(str::to_string);
            if cursor.is_none() {
                break;
            }
        }
        debug!(server = %self.server, count = tools.len(), "tool catalogue received");
        Ok(tools)
    }

    pub(super) async fn call_tool(
        &self,
        tool: &str,
        arguments: Value,
    ) -> Result<ToolResult, ToolInvokeError> {
        let params = json!({
            "name": tool,
            "arguments": match arguments {
                Value::Null => Value::Object(Default::default()),
                other => other,
            }
        });
        let result = self.send_request("tools/call", params).await?;
        Ok(ToolResult::new(result))
    }

    /// Route one decoded message coming from the provider.
    pub(super) async fn process_inbound(&self, value: Value) {
        let outcome = if let Some(id) = value.get("id").cloned() {
            if value.get("method").is_some() {
                self.handle_server_request(id, &value).await
            } else {
                self.handle_response(id, value).await;
                Ok(())
            }
        } else {
            if let Some(method) = value.get("method").and_then(Value::as_str) {
                debug!(server = %self.server, method, "received notification from tool provider");
            }
            Ok(())
        };
        if let Err(err) = outcome {
            warn!(server = %self.server, %err, "failed to process message from tool provider");
        }
    }

    /// Fail every in-flight request and refuse new ones.
    pub(super) async fn close(&self) {
        let mut pending = self.pending.lock().await;
        pending.closed = true;
        for (_, sender) in pending.waiters.drain() {
            let _ = sender.send(Err(ToolInvokeError::Terminated {
                server: self.server.clone(),
            }));
        }
    }

    async fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };
        let responder = self.pending.lock().await.waiters.remove(&key);
        let Some(sender) = responder else {
            debug!(server = %self.server, response_id = key, "received response for unknown request");
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => {
                let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32000);
                let message = error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string();
                Err(ToolInvokeError::Rpc {
                    server: self.server.clone(),
                    code,
                    message,
                })
            }
            None => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
        };
        let _ = sender.send(outcome);
    }

    async fn handle_server_request(&self, id: Value, value: &Value) -> Result<(), ToolInvokeError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let reply = match method {
            "ping" => json!({ "jsonrpc": "2.0", "id": id, "result": {} }),
            other => {
                warn!(server = %self.server, method = other, "tool provider sent unsupported request");
                json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": -32601,
                        "message": format!("client does not implement method '{other}'"),
                    }
                })
            }
        };
        self.outbound.send(&reply).await
    }

    async fn send_request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(ToolInvokeError::Terminated {
                    server: self.server.clone(),
                });
            }
            pending.waiters.insert(id.clone(), tx);
        }

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        if let Err(err) = self.outbound.send(&payload).await {
            self.pending.lock().await.waiters.remove(&id);
            return Err(err);
        }

        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ToolInvokeError::Cancelled {
                server: self.server.clone(),
            }),
        }
    }

    async fn send_notification(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.outbound.send(&payload).await
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records outbound messages; the test plays the provider.
    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<Value>>>,
    }

    #[async_trait]
    impl Outbound for Recorder {
        async fn send(&self, message: &Value) -> Result<(), ToolInvokeError> {
            self.sent.lock().expect("lock").push(message.clone());
            Ok(())
        }
    }

    async fn wait_for_request(recorder: &Recorder, count: usize) -> Value {
        for _ in 0..100 {
            if let Some(message) = recorder.sent.lock().expect("lock").get(count - 1) {
                return message.clone();
            }
            tokio::task::yield_now().await;
        }
        panic!("request {count} was never sent");
    }

    #[tokio::test]
    async fn responses_are_routed_by_id() {
        let recorder = Recorder::default();
        let connection = Arc::new(McpConnection::new("test", Box::new(recorder.clone())));

        let caller = Arc::clone(&connection);
        let call = tokio::spawn(async move { caller.call_tool("echo", Value::Null).await });

        let request = wait_for_request(&recorder, 1).await;
        assert_eq!(request["method"], "tools/call");
        assert_eq!(request["params"]["arguments"], json!({}));
        connection
            .process_inbound(json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "result": {"content": [{"type": "text", "text": "ok"}]}
            }))
            .await;

        let result = call.await.expect("join").expect("result");
        assert_eq!(result.first_text(), Some("ok"));
    }

    #[tokio::test]
    async fn rpc_errors_are_surfaced() {
        let recorder = Recorder::default();
        let connection = Arc::new(McpConnection::new("test", Box::new(recorder.clone())));

        let caller = Arc::clone(&connection);
        let call = tokio::spawn(async move { caller.list_tools().await });
        let request = wait_for_request(&recorder, 1).await;
        connection
            .process_inbound(json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "error": {"code": -32601, "message": "nope"}
            }))
            .await;

        let err = call.await.expect("join").unwrap_err();
        assert!(matches!(err, ToolInvokeError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn closing_fails_pending_and_future_requests() {
        let recorder = Recorder::default();
        let connection = Arc::new(McpConnection::new("test", Box::new(recorder.clone())));

        let caller = Arc::clone(&connection);
        let call = tokio::spawn(async move { caller.list_tools().await });
        wait_for_request(&recorder, 1).await;
        connection.close().await;

        let err = call.await.expect("join").unwrap_err();
        assert!(matches!(err, ToolInvokeError::Terminated { .. }));
        assert!(matches!(
            connection.list_tools().await,
            Err(ToolInvokeError::Terminated { .. })
        ));
    }

    #[tokio::test]
    async fn server_pings_are_answered() {
        let recorder = Recorder::default();
        let connection = McpConnection::new("test", Box::new(recorder.clone()));
        connection
            .process_inbound(json!({"jsonrpc": "2.0", "id": 7, "method": "ping"}))
            .await;
        connection
            .process_inbound(json!({"jsonrpc": "2.0", "id": 8, "method": "sampling/createMessage"}))
            .await;

        let sent = recorder.sent.lock().expect("lock").clone();
        assert_eq!(sent[0]["id"], 7);
        assert_eq!(sent[0]["result"], json!({}));
        assert_eq!(sent[1]["error"]["code"], -32601);
    }
}
