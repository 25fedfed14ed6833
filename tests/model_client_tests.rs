// Model client tests - OpenAIClient against a local chat-completions stub
//
// The stub speaks just enough of the OpenAI wire format: plain JSON replies,
// tool calls, and `stream: true` replies as server-sent events.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use sentiment_brief::config::ProviderConfig;
use sentiment_brief::model::{ChatModel, CompletionRequest, ModelError, OpenAIClient};
use sentiment_brief::types::{ChatMessage, MessageRole, ToolDescriptor, empty_object_schema};
use serde_json::{Value, json};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

// ============================================================================
// Stub provider
// ============================================================================

#[derive(Clone, Default)]
struct Recorded {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Recorded {
    fn last(&self) -> (Option<String>, Value) {
        self.requests
            .lock()
            .expect("lock")
            .last()
            .cloned()
            .expect("at least one request")
    }
}

async fn completions(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    recorded
        .requests
        .lock()
        .expect("lock")
        .push((auth, body.clone()));

    let last_user = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    if last_user == "boom" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream failure").into_response();
    }

    if body["stream"].as_bool() == Some(true) {
        let chunks = [
            json!({"choices": [{"delta": {"reasoning_content": "先看"}}]}),
            json!({"choices": [{"delta": {"reasoning_content": "订单"}}]}),
            json!({"choices": [{"delta": {"content": "1.否"}}]}),
            json!({"choices": [{"delta": {"content": " 2.否"}, "finish_reason": "stop"}]}),
        ];
        let events = chunks
            .into_iter()
            .map(|chunk| chunk.to_string())
            .chain(std::iter::once("[DONE]".to_string()))
            .map(|data| Ok::<_, Infallible>(Event::default().data(data)));
        return Sse::new(futures::stream::iter(events)).into_response();
    }

    let has_tools = body["tools"].as_array().is_some_and(|t| !t.is_empty());
    if has_tools && last_user.contains("舆情") {
        return Json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_7",
                        "type": "function",
                        "function": {"name": "start_crawler", "arguments": "{}"}
                    }]
                }
            }]
        }))
        .into_response();
    }

    Json(json!({
        "choices": [{
            "message": {"role": "assistant", "content": format!("echo: {last_user}")}
        }]
    }))
    .into_response()
}

async fn start_stub() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(recorded.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, recorded)
}

fn client(addr: SocketAddr) -> OpenAIClient {
    let config = ProviderConfig {
        id: "stub".to_string(),
        endpoint: format!("http://{addr}/v1/"),
        api_path: "/chat/completions".to_string(),
        api_key_env: "UNUSED_KEY".to_string(),
        model: "qwen-plus".to_string(),
    };
    OpenAIClient::new(&config, "test-key".to_string())
}

fn crawler_descriptor() -> ToolDescriptor {
    ToolDescriptor::new("start_crawler", "crawl today's posts", empty_object_schema())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn plain_completion_returns_assistant_text() {
    let (addr, recorded) = start_stub().await;
    let reply = client(addr)
        .complete(CompletionRequest::new(
            "qwen-plus",
            vec![ChatMessage::system("be brief"), ChatMessage::user("你好")],
        ))
        .await
        .expect("reply");

    assert_eq!(reply.role, MessageRole::Assistant);
    assert_eq!(reply.content, "echo: 你好");
    assert!(reply.tool_calls.is_empty());

    let (auth, body) = recorded.last();
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["model"], "qwen-plus");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["stream"], false);
}

#[tokio::test]
async fn tool_call_reply_is_parsed() {
    let (addr, recorded) = start_stub().await;
    let reply = client(addr)
        .complete(
            CompletionRequest::new("qwen-plus", vec![ChatMessage::user("完成今日舆情分析")])
                .with_tools(vec![crawler_descriptor()]),
        )
        .await
        .expect("reply");

    assert!(reply.content.is_empty());
    let call = reply.first_tool_call().expect("tool call");
    assert_eq!(call.id, "call_7");
    assert_eq!(call.name, "start_crawler");
    assert_eq!(call.arguments, "{}");

    let (_, body) = recorded.last();
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "start_crawler");
}

#[tokio::test]
async fn tool_messages_are_sent_with_call_ids() {
    let (addr, recorded) = start_stub().await;
    let assistant = ChatMessage::assistant("").with_tool_calls(vec![
        sentiment_brief::types::ToolCall {
            id: "call_7".into(),
            name: "start_crawler".into(),
            arguments: "{}".into(),
        },
    ]);
    let messages = vec![
        ChatMessage::user("完成今日舆情分析"),
        assistant,
        ChatMessage::tool(
            "start_crawler",
            Some("call_7".into()),
            r#"{"status":"success"}"#,
        ),
        ChatMessage::user("继续"),
    ];
    client(addr)
        .complete(CompletionRequest::new("qwen-plus", messages))
        .await
        .expect("reply");

    let (_, body) = recorded.last();
    assert_eq!(body["messages"][1]["tool_calls"][0]["id"], "call_7");
    assert_eq!(body["messages"][2]["role"], "tool");
    assert_eq!(body["messages"][2]["tool_call_id"], "call_7");
}

#[tokio::test]
async fn streaming_completion_accumulates_reasoning_and_content() {
    let (addr, recorded) = start_stub().await;
    let reply = client(addr)
        .complete_streaming(CompletionRequest::new(
            "qwq-plus",
            vec![ChatMessage::user("订单增长")],
        ))
        .await
        .expect("reply");

    assert_eq!(reply.reasoning, "先看订单");
    assert_eq!(reply.content, "1.否 2.否");
    let (_, body) = recorded.last();
    assert_eq!(body["stream"], true);
}

#[tokio::test]
async fn http_failures_surface_as_model_errors() {
    let (addr, _) = start_stub().await;
    let model = client(addr);

    let err = model
        .complete(CompletionRequest::new("qwen-plus", vec![ChatMessage::user("boom")]))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Network { .. }));

    let err = model
        .complete_streaming(CompletionRequest::new(
            "qwq-plus",
            vec![ChatMessage::user("boom")],
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Stream { .. }));
}
