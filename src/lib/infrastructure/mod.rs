//! # Infrastructure Module
//!
//! - [`model`] - chat-completion clients
//! - [`rpc`] - JSON-RPC dispatch for the tool servers
//! - [`server`] - SSE transport for the tool servers

pub mod model;
pub mod rpc;
pub mod server;
