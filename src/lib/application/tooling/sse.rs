//! Tool provider reached over HTTP server-sent events.
//!
//! `GET <base>/sse` yields an `endpoint` event naming the URL that accepts
//! JSON-RPC posts; replies come back as `message` events on the same stream.

use super::connection::{McpConnection, Outbound};
use super::error::ToolInvokeError;
use super::interface::{ToolResult, ToolSession};
use crate::types::ToolDescriptor;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource, retry::Never};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct SseSession {
    connection: Arc<McpConnection>,
    reader: JoinHandle<()>,
}

struct PostOutbound {
    server: String,
    http: Client,
    endpoint: Url,
}

#[async_trait]
impl Outbound for PostOutbound {
    async fn send(&self, message: &Value) -> Result<(), ToolInvokeError> {
        self.http
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| ToolInvokeError::transport(&self.server, err.to_string()))?;
        Ok(())
    }
}

impl SseSession {
    /// Open the event stream, wait for the message endpoint and run the
    /// MCP handshake, all within `timeout`.
    pub async fn connect(
        name: impl Into<String>,
        sse_url: &str,
        timeout: Duration,
    ) -> Result<Self, ToolInvokeError> {
        let name = name.into();
        let base = Url::parse(sse_url)
            .map_err(|err| ToolInvokeError::transport(&name, format!("invalid url {sse_url}: {err}")))?;

        let timed_out = || ToolInvokeError::ConnectTimeout {
            server: name.clone(),
            timeout_ms: timeout.as_millis() as u64,
        };

        let http = Client::new();
        let mut source = EventSource::new(http.get(base.clone()))
            .map_err(|err| ToolInvokeError::transport(&name, err.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        let endpoint = tokio::time::timeout(timeout, wait_for_endpoint(&name, &mut source))
            .await
            .map_err(|_| timed_out())??;
        let endpoint = base
            .join(&endpoint)
            .map_err(|err| ToolInvokeError::transport(&name, format!("bad endpoint: {err}")))?;
        info!(server = name.as_str(), endpoint = %endpoint, "SSE session established");

        let outbound = PostOutbound {
            server: name.clone(),
            http,
            endpoint,
        };
        let connection = Arc::new(McpConnection::new(name.clone(), Box::new(outbound)));
        let reader = tokio::spawn(reader_loop(Arc::clone(&connection), source));
        let session = Self { connection, reader };

        match tokio::time::timeout(timeout, session.connection.initialize()).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(err)) => {
                session.close().await;
                Err(err)
            }
            Err(_) => {
                session.close().await;
                Err(timed_out())
            }
        }
    }
}

async fn wait_for_endpoint(
    server: &str,
    source: &mut EventSource,
) -> Result<String, ToolInvokeError> {
    while let Some(event) = source.next().await {
        match event {
            Ok(Event::Open) => debug!(server, "SSE stream opened"),
            Ok(Event::Message(message)) if message.event == "endpoint" => {
                return Ok(message.data.trim().to_string());
            }
            Ok(Event::Message(message)) => {
                debug!(server, event = message.event.as_str(), "ignoring event before endpoint");
            }
            Err(EventSourceError::StreamEnded) => break,
            Err(err) => return Err(ToolInvokeError::transport(server, err.to_string())),
        }
    }
    Err(ToolInvokeError::Terminated {
        server: server.to_string(),
    })
}

async fn reader_loop(connection: Arc<McpConnection>, mut source: EventSource) {
    while let Some(event) = source.next().await {
        match event {
            Ok(Event::Open) => {}
            Ok(Event::Message(message)) if message.event == "message" => {
                match serde_json::from_str::<Value>(&message.data) {
                    Ok(value) => connection.process_inbound(value).await,
                    Err(err) => warn!(
                        server = connection.server(),
                        %err,
                        "received invalid JSON from tool provider"
                    ),
                }
            }
            Ok(Event::Message(message)) => {
                debug!(server = connection.server(), event = message.event.as_str(), "ignoring SSE event");
            }
            Err(EventSourceError::StreamEnded) => break,
            Err(err) => {
                warn!(server = connection.server(), %err, "SSE stream failed");
                break;
            }
        }
    }
    source.close();
    connection.close().await;
}

#[async_trait]
impl ToolSession for SseSession {
    fn name(&self) -> &str {
        self.connection.server()
    }

    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, ToolInvokeError> {
        self.connection.list_tools().await
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<ToolResult, ToolInvokeError> {
        self.connection.call_tool(name, arguments).await
    }

    async fn close(&self) {
        self.reader.abort();
        self.connection.close().await;
    }
}
