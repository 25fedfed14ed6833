//! SSE transport for the tool servers.
//!
//! A client opens `GET /sse`, receives an `endpoint` event naming its message
//! URL, then POSTs JSON-RPC messages there. Replies arrive on the open stream
//! as `message` events.

mod error;
mod router;
mod routes;
mod state;

pub use error::ServerError;
pub(crate) use state::ServerState;

use crate::infrastructure::rpc::McpDispatcher;
use std::net::SocketAddr;
use tokio::net::TcpListener;

pub async fn serve(dispatcher: McpDispatcher, addr: SocketAddr) -> Result<(), ServerError> {
    router::serve(dispatcher, addr).await
}

/// Serve on an already bound listener.
pub async fn serve_listener(
    dispatcher: McpDispatcher,
    listener: TcpListener,
) -> Result<(), ServerError> {
    router::serve_listener(dispatcher, listener).await
}
