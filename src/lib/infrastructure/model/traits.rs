//! Model traits

use super::types::{CompletionRequest, ModelError, StreamedReply};
use crate::types::ChatMessage;
use async_trait::async_trait;
use std::sync::Arc;

/// A chat-completion endpoint.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the transcript (and tool schemas) and return the model's reply.
    /// The reply may carry tool calls instead of, or next to, text.
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ModelError>;

    /// Streamed variant that keeps the model's reasoning apart from its answer.
    /// Backends without streaming fall back to `complete`.
    async fn complete_streaming(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamedReply, ModelError> {
        let message = self.complete(request).await?;
        Ok(StreamedReply {
            reasoning: String::new(),
            content: message.content,
        })
    }
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Arc<T> {
    async fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ModelError> {
        (**self).complete(request).await
    }

    async fn complete_streaming(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamedReply, ModelError> {
        (**self).complete_streaming(request).await
    }
}
