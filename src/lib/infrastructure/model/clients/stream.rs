//! Accumulates `chat.completion.chunk` events into a [`StreamedReply`].

use crate::infrastructure::model::types::StreamedReply;
use serde::Deserialize;

const DONE_MARKER: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamProgress {
    Continue,
    Done,
}

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    reply: StreamedReply,
}

impl StreamAccumulator {
    /// Feed the `data` field of one server-sent event.
    pub fn push(&mut self, data: &str) -> Result<StreamProgress, String> {
        let data = data.trim();
        if data == DONE_MARKER {
            return Ok(StreamProgress::Done);
        }
        if data.is_empty() {
            return Ok(StreamProgress::Continue);
        }

        let chunk: Chunk =
            serde_json::from_str(data).map_err(|err| format!("malformed chunk: {err}"))?;
        if let Some(error) = chunk.error {
            return Err(error.message);
        }

        // usage-only chunks arrive with an empty choices list
        for choice in chunk.choices {
            if let Some(reasoning) = choice.delta.reasoning_content {
                self.reply.reasoning.push_str(&reasoning);
            }
            if let Some(content) = choice.delta.content {
                self.reply.content.push_str(&content);
            }
            if choice.finish_reason.is_some() {
                return Ok(StreamProgress::Done);
            }
        }
        Ok(StreamProgress::Continue)
    }

    pub fn finish(self) -> StreamedReply {
        self.reply
    }
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning_content: Option<String>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_and_content_are_kept_apart() {
        let mut acc = StreamAccumulator::default();
        let chunks = [
            r#"{"choices":[{"delta":{"reasoning_content":"think "}}]}"#,
            r#"{"choices":[{"delta":{"reasoning_content":"hard"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Neutral"}}]}"#,
            r#"{"choices":[{"delta":{"content":" outlook"}}]}"#,
        ];
        for chunk in chunks {
            assert_eq!(acc.push(chunk), Ok(StreamProgress::Continue));
        }
        assert_eq!(acc.push("[DONE]"), Ok(StreamProgress::Done));

        let reply = acc.finish();
        assert_eq!(reply.reasoning, "think hard");
        assert_eq!(reply.content, "Neutral outlook");
    }

    #[test]
    fn usage_chunks_without_choices_are_ignored() {
        let mut acc = StreamAccumulator::default();
        let progress = acc.push(r#"{"choices":[],"usage":{"total_tokens":12}}"#);
        assert_eq!(progress, Ok(StreamProgress::Continue));
        assert_eq!(acc.finish(), StreamedReply::default());
    }

    #[test]
    fn finish_reason_ends_the_stream() {
        let mut acc = StreamAccumulator::default();
        let progress =
            acc.push(r#"{"choices":[{"delta":{"content":"yes"},"finish_reason":"stop"}]}"#);
        assert_eq!(progress, Ok(StreamProgress::Done));
        assert_eq!(acc.finish().content, "yes");
    }

    #[test]
    fn error_payload_is_reported() {
        let mut acc = StreamAccumulator::default();
        let err = acc
            .push(r#"{"error":{"message":"quota exceeded"}}"#)
            .unwrap_err();
        assert_eq!(err, "quota exceeded");
    }
}
