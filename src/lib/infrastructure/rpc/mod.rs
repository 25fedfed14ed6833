//! JSON-RPC plumbing for the tool servers.
//!
//! - `types` - request/response envelopes
//! - `catalog` - tools a server exposes
//! - `dispatcher` - MCP method routing
//! - `stdio` - newline-delimited transport over stdin/stdout

pub mod catalog;
pub mod dispatcher;
pub mod stdio;
pub mod types;

pub use catalog::{ToolCatalog, ToolError, ToolHandler};
pub use dispatcher::McpDispatcher;
pub use types::{RpcRequest, RpcResponse};
