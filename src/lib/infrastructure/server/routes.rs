use super::state::{ServerState, SessionGuard};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub(super) async fn sse_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let session_id = Uuid::new_v4().simple().to_string();
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    state.open_session(session_id.clone(), tx);
    info!(session_id = session_id.as_str(), "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages/?session_id={session_id}"));
    let guard = SessionGuard {
        state,
        id: session_id,
    };

    let messages = UnboundedReceiverStream::new(rx)
        .map(|data| Event::default().event("message").data(data));
    let events = stream::once(async move { endpoint })
        .chain(messages)
        .map(move |event| {
            let _session = &guard;
            Ok(event)
        });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[derive(Deserialize)]
pub(super) struct MessageQuery {
    session_id: String,
}

pub(super) async fn message_handler(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> StatusCode {
    let Some(sender) = state.session(&query.session_id) else {
        warn!(session_id = query.session_id.as_str(), "Message for unknown session");
        return StatusCode::NOT_FOUND;
    };
    let Ok(text) = String::from_utf8(body.to_vec()) else {
        return StatusCode::BAD_REQUEST;
    };

    let dispatcher = state.dispatcher().clone();
    tokio::spawn(async move {
        if let Some(reply) = dispatcher.handle_text(&text).await {
            if sender.send(reply).is_err() {
                debug!("SSE session went away before the reply was sent");
            }
        }
    });
    StatusCode::ACCEPTED
}
