//! Client side of the tool providers: sessions, transports, launching.

mod connection;
mod error;
mod interface;
mod launcher;
mod process;
mod sse;

pub use error::ToolInvokeError;
pub use interface::{ToolResult, ToolSession};
pub use launcher::{ProviderSpec, ServerLauncher};
pub use process::StdioSession;
pub use sse::SseSession;
