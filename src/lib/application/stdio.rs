use crate::application::conversation::Conversation;
use crate::infrastructure::model::ChatModel;
use thiserror::Error;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{error, info};

const QUIT_COMMAND: &str = "quit";

#[derive(Debug, Error)]
pub enum StdioError {
    #[error("stdin/stdout I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interactive loop on the process's stdin/stdout.
pub async fn run<M: ChatModel>(conversation: &mut Conversation<M>) -> Result<(), StdioError> {
    run_with_io(conversation, BufReader::new(io::stdin()), io::stdout()).await
}

/// One query per line until `quit` or end of input. A failed query is shown
/// and the loop keeps going.
pub async fn run_with_io<M, R, W>(
    conversation: &mut Conversation<M>,
    reader: R,
    mut writer: W,
) -> Result<(), StdioError>
where
    M: ChatModel,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    write_line(&mut writer, "Client started. Type a query, or 'quit' to exit.").await?;

    loop {
        writer.write_all(b"\nQuery: ").await?;
        writer.flush().await?;

        let Some(line) = lines.next_line().await? else {
            info!("stdin closed, leaving interactive mode");
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case(QUIT_COMMAND) {
            info!("quit requested");
            break;
        }

        answer_query(conversation, query, &mut writer).await?;
    }
    Ok(())
}

/// Run a single query and print its outcome.
pub async fn answer_query<M, W>(
    conversation: &mut Conversation<M>,
    query: &str,
    writer: &mut W,
) -> Result<bool, StdioError>
where
    M: ChatModel,
    W: AsyncWrite + Unpin,
{
    match conversation.process_query(query).await {
        Ok(Some(answer)) => {
            write_line(writer, &format!("\n{answer}")).await?;
            Ok(true)
        }
        Ok(None) => {
            write_line(writer, "\n(no answer)").await?;
            Ok(true)
        }
        Err(err) => {
            error!(error = %err, "query failed");
            write_line(writer, &format!("\nError: {}", err.user_message())).await?;
            Ok(false)
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> Result<(), StdioError> {
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::conversation::ConversationOptions;
    use crate::infrastructure::model::{CompletionRequest, ModelError};
    use crate::types::ChatMessage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Replies(Mutex<VecDeque<ChatMessage>>);

    #[async_trait]
    impl ChatModel for Replies {
        async fn complete(&self, _request: CompletionRequest) -> Result<ChatMessage, ModelError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::invalid_response("stub", "no reply left"))
        }
    }

    async fn conversation(replies: Vec<ChatMessage>) -> Conversation<Replies> {
        let options = ConversationOptions {
            model: "stub".into(),
            system_prompt: "system".into(),
            final_tool: None,
            max_turns: 4,
        };
        Conversation::connect(Replies(Mutex::new(replies.into())), Vec::new(), options)
            .await
            .expect("connect")
    }

    #[tokio::test]
    async fn errors_do_not_end_the_loop() {
        let mut conversation = conversation(vec![ChatMessage::assistant("")]).await;
        let input = "first\n\nsecond\nthird\n";
        let mut output = Vec::new();

        run_with_io(&mut conversation, input.as_bytes(), &mut output)
            .await
            .expect("loop");

        let text = String::from_utf8(output).expect("utf8");
        assert!(text.contains("(no answer)"));
        assert_eq!(text.matches("Error:").count(), 2);
        // system + 3 users + 1 assistant
        assert_eq!(conversation.transcript().len(), 5);
    }

    #[tokio::test]
    async fn quit_stops_before_later_lines() {
        let mut conversation = conversation(vec![ChatMessage::assistant("")]).await;
        let mut output = Vec::new();

        run_with_io(&mut conversation, "QUIT\nignored\n".as_bytes(), &mut output)
            .await
            .expect("loop");

        assert!(conversation.transcript().is_empty());
    }
}
