// SSE transport tests - McpDispatcher served over HTTP, reached by SseSession
//
// Both halves of the transport run in-process on an ephemeral port.

use async_trait::async_trait;
use sentiment_brief::rpc::{McpDispatcher, ToolCatalog, ToolError, ToolHandler};
use sentiment_brief::server;
use sentiment_brief::tooling::{SseSession, ToolInvokeError, ToolSession};
use sentiment_brief::types::ToolDescriptor;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const TIMEOUT: Duration = Duration::from_secs(5);

struct Shout;

#[async_trait]
impl ToolHandler for Shout {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "shout",
            "Upper-case a word",
            json!({
                "type": "object",
                "properties": {"word": {"type": "string"}},
                "required": ["word"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let word = arguments
            .get("word")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidArguments("word must be a string".into()))?;
        if word == "fail" {
            return Err(ToolError::Failed("refusing to shout".into()));
        }
        Ok(json!({ "status": "success", "word": word.to_uppercase() }))
    }
}

async fn start_server() -> String {
    let catalog = ToolCatalog::new("ShoutServer").with_tool(Arc::new(Shout));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = server::serve_listener(McpDispatcher::new(catalog), listener).await;
    });
    format!("http://{addr}/sse")
}

#[tokio::test]
async fn session_lists_and_calls_tools() {
    let url = start_server().await;
    let session = SseSession::connect("shout", &url, TIMEOUT)
        .await
        .expect("connect");

    let tools = session.list_tools().await.expect("tools");
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "shout");
    assert_eq!(tools[0].parameter_schema["required"][0], "word");

    let result = session
        .call_tool("shout", json!({"word": "brief"}))
        .await
        .expect("call");
    assert!(!result.is_error());
    let payload: Value =
        serde_json::from_str(result.first_text().expect("text")).expect("json text");
    assert_eq!(payload["word"], "BRIEF");
    assert_eq!(result.raw()["structuredContent"]["status"], "success");

    session.close().await;
}

#[tokio::test]
async fn handler_failures_arrive_as_error_results() {
    let url = start_server().await;
    let session = SseSession::connect("shout", &url, TIMEOUT)
        .await
        .expect("connect");

    let result = session
        .call_tool("shout", json!({"word": "fail"}))
        .await
        .expect("call");
    assert!(result.is_error());
    assert_eq!(result.first_text(), Some("refusing to shout"));
}

#[tokio::test]
async fn invalid_arguments_are_rpc_errors() {
    let url = start_server().await;
    let session = SseSession::connect("shout", &url, TIMEOUT)
        .await
        .expect("connect");

    let err = session.call_tool("shout", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolInvokeError::Rpc { code: -32602, .. }));

    let err = session.call_tool("whisper", json!({})).await.unwrap_err();
    assert!(matches!(err, ToolInvokeError::Rpc { code: -32602, .. }));
}

#[tokio::test]
async fn concurrent_sessions_are_independent() {
    let url = start_server().await;
    let first = SseSession::connect("first", &url, TIMEOUT)
        .await
        .expect("connect");
    let second = SseSession::connect("second", &url, TIMEOUT)
        .await
        .expect("connect");

    let (a, b) = tokio::join!(
        first.call_tool("shout", json!({"word": "a"})),
        second.call_tool("shout", json!({"word": "b"})),
    );
    assert_eq!(a.expect("a").raw()["structuredContent"]["word"], "A");
    assert_eq!(b.expect("b").raw()["structuredContent"]["word"], "B");
}

#[tokio::test]
async fn unreachable_server_fails_to_connect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let result = SseSession::connect("gone", &format!("http://{addr}/sse"), TIMEOUT).await;
    assert!(result.is_err());
}
