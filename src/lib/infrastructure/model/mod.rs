//! Model infrastructure module
//!
//! Chat-completion backends the conversation loop and the analysis server
//! talk to.
//!
//! # Structure
//! - `types` - Request, Response, Error types
//! - `traits` - ChatModel trait
//! - `adapter` - Message and tool-schema wire format
//! - `clients` - OpenAI-compatible HTTP client and stream accumulator

pub mod adapter;
pub mod clients;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use clients::OpenAIClient;
pub use traits::ChatModel;
pub use types::{CompletionRequest, ModelError, StreamedReply};
