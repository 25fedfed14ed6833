//! # Conversation Module
//!
//! Drives a tool-augmented chat with the model until the final-answer tool
//! produces a result.
//!
//! ## Key Types
//!
//! - [`Conversation`] - owns the transcript, the tool registry and the turn loop
//! - [`ConversationOptions`] - model name, system prompt, final tool, turn ceiling
//! - [`ToolRegistry`] - tool name to serving session
//! - [`ConversationError`] - everything a turn can fail with
//!
//! ## Turn Loop
//!
//! 1. Send the transcript and every tool schema to the model
//! 2. Append the reply
//! 3. If it asks for a tool, run the first requested call
//! 4. The final tool's result is the answer; any other result is appended and
//!    the loop continues

mod errors;
mod orchestrator;
mod registry;
mod transcript;


pub use errors::ConversationError;
pub use orchestrator::{Conversation, ConversationOptions};
pub use registry::ToolRegistry;
pub use transcript::Transcript;
