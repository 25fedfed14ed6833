use crate::infrastructure::rpc::McpDispatcher;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

pub(crate) struct ServerState {
    dispatcher: McpDispatcher,
    sessions: Mutex<HashMap<String, UnboundedSender<String>>>,
}

impl ServerState {
    pub fn new(dispatcher: McpDispatcher) -> Self {
        Self {
            dispatcher,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn dispatcher(&self) -> &McpDispatcher {
        &self.dispatcher
    }

    pub fn open_session(&self, id: String, sender: UnboundedSender<String>) {
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.insert(id, sender);
        }
    }

    pub fn session(&self, id: &str) -> Option<UnboundedSender<String>> {
        self.sessions.lock().ok()?.get(id).cloned()
    }

    pub fn close_session(&self, id: &str) {
        if let Ok(mut sessions) = self.sessions.lock() {
            if sessions.remove(id).is_some() {
                debug!(session_id = id, "SSE session closed");
            }
        }
    }
}

/// Drops the session from the map when its event stream goes away.
pub(crate) struct SessionGuard {
    pub state: Arc<ServerState>,
    pub id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.close_session(&self.id);
    }
}
