//! Tool provider spoken to over a child process's stdin/stdout.

use super::connection::{McpConnection, Outbound};
use super::error::ToolInvokeError;
use super::interface::{ToolResult, ToolSession};
use crate::config::ServerConfig;
use crate::types::ToolDescriptor;
use async_trait::async_trait;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct StdioSession {
    connection: Arc<McpConnection>,
    child: AsyncMutex<Option<Child>>,
    reader: JoinHandle<()>,
}

struct StdinOutbound {
    server: String,
    writer: AsyncMutex<BufWriter<ChildStdin>>,
}

#[async_trait]
impl Outbound for StdinOutbound {
    async fn send(&self, message: &Value) -> Result<(), ToolInvokeError> {
        let encoded =
            serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
                server: self.server.clone(),
                source,
            })?;

        let mut writer = self.writer.lock().await;
        let io_error = |source: std::io::Error| ToolInvokeError::transport(&self.server, source.to_string());
        writer.write_all(encoded.as_bytes()).await.map_err(io_error)?;
        writer.write_all(b"\n").await.map_err(io_error)?;
        writer.flush().await.map_err(io_error)?;
        Ok(())
    }
}

impl StdioSession {
    /// Spawn the configured command and complete the MCP handshake.
    pub async fn spawn(
        server: &ServerConfig,
        handshake_timeout: Duration,
    ) -> Result<Self, ToolInvokeError> {
        let mut command = Command::new(&server.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &server.workdir {
            command.current_dir(dir);
        }
        if !server.args.is_empty() {
            command.args(&server.args);
        }
        for (key, value) in &server.env {
            command.env(key, value);
        }

        let mut child = command.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: server.name.clone(),
            source,
        })?;
        info!(server = %server.name, command = %server.command.display(), "spawned stdio tool provider");

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolInvokeError::transport(&server.name, "failed to capture stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolInvokeError::transport(&server.name, "failed to capture stdout"))?;

        let outbound = StdinOutbound {
            server: server.name.clone(),
            writer: AsyncMutex::new(BufWriter::new(stdin)),
        };
        let connection = Arc::new(McpConnection::new(server.name.clone(), Box::new(outbound)));
        let reader = tokio::spawn(reader_loop(Arc::clone(&connection), stdout));

        let session = Self {
            connection,
            child: AsyncMutex::new(Some(child)),
            reader,
        };

        match tokio::time::timeout(handshake_timeout, session.connection.initialize()).await {
            Ok(Ok(())) => Ok(session),
            Ok(Err(err)) => {
                session.close().await;
                Err(err)
            }
            Err(_) => {
                session.close().await;
                Err(ToolInvokeError::ConnectTimeout {
                    server: server.name.clone(),
                    timeout_ms: handshake_timeout.as_millis() as u64,
                })
            }
        }
    }
}

async fn reader_loop(connection: Arc<McpConnection>, stdout: ChildStdout) {
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(raw)) = lines.next_line().await {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('\u{1b}') {
            debug!(
                server = connection.server(),
                line = trimmed,
                "skipping non-JSON ANSI log line from tool provider"
            );
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => connection.process_inbound(value).await,
            Err(source) => warn!(
                server = connection.server(),
                line = trimmed,
                %source,
                "received invalid JSON from tool provider"
            ),
        }
    }
    debug!(server = connection.server(), "tool provider stdout closed");
    connection.close().await;
}

#[async_trait]
impl ToolSession for StdioSession {
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
        self.connection.close().await;
        self.reader.abort();
        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(err) = child.kill().await {
                debug!(
                    server = self.connection.server(),
                    %err,
                    "failed to kill tool provider (may have already exited)"
                );
            }
        }
    }
}
