use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use crate::infrastructure::rpc::McpDispatcher;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub(super) fn build(dispatcher: McpDispatcher) -> Router {
    let state = Arc::new(ServerState::new(dispatcher));
    Router::new()
        .route("/sse", get(routes::sse_handler))
        .route("/messages/", post(routes::message_handler))
        .route("/messages", post(routes::message_handler))
        .with_state(state)
}

pub(super) async fn serve(dispatcher: McpDispatcher, addr: SocketAddr) -> Result<(), ServerError> {
    info!(%addr, "Binding SSE server");
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    serve_listener(dispatcher, listener).await
}

pub(super) async fn serve_listener(
    dispatcher: McpDispatcher,
    listener: TcpListener,
) -> Result<(), ServerError> {
    let server = dispatcher.catalog().name().to_string();
    let app = build(dispatcher);
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, server = server.as_str(), "SSE server ready to accept connections");
    }

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}
