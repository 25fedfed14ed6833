use crate::infrastructure::model::{ChatModel, CompletionRequest, ModelError, StreamedReply};
use crate::types::ChatMessage;
use async_trait::async_trait;
use std::sync::Mutex;

/// Streams numbered canned replies; fails when the last message equals
/// `fail_on`.
pub(crate) struct CannedModel {
    fail_on: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl CannedModel {
    pub(crate) fn new(fail_on: Option<&str>) -> Self {
        Self {
            fail_on: fail_on.map(str::to_string),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for CannedModel {
    async fn complete(&self, _request: CompletionRequest) -> Result<ChatMessage, ModelError> {
        Err(ModelError::invalid_response("canned", "only streaming is scripted"))
    }

    async fn complete_streaming(
        &self,
        request: CompletionRequest,
    ) -> Result<StreamedReply, ModelError> {
        let last = request.messages.last().map(|m| m.content.clone());
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        if last.is_some() && last == self.fail_on {
            return Err(ModelError::stream("canned", "scripted failure"));
        }
        let n = requests.len();
        Ok(StreamedReply {
            reasoning: format!("reasoning {n}"),
            content: format!("verdict {n}"),
        })
    }
}
