//! Serve a [`McpDispatcher`] over newline-delimited stdin/stdout.

use super::dispatcher::McpDispatcher;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

pub async fn serve(dispatcher: McpDispatcher) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve_io(dispatcher, stdin, stdout).await
}

/// Transport loop over arbitrary streams; ends when the reader reaches EOF.
pub async fn serve_io<R, W>(dispatcher: McpDispatcher, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(server = dispatcher.catalog().name(), "Serving MCP over stdio");
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(reply) = dispatcher.handle_text(trimmed).await {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    debug!("stdin closed, stopping stdio transport");
    Ok(())
}
