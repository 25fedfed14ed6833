use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolInvokeError {
    #[error("tool provider '{server}' is not configured or its script is missing")]
    NotConfigured { server: String },
    #[error("failed to spawn tool provider '{server}': {source}")]
    Spawn {
        server: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool provider '{server}' transport error: {message}")]
    Transport { server: String, message: String },
    #[error("tool provider '{server}' returned invalid JSON: {source}")]
    InvalidJson {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("tool provider '{server}' returned JSON-RPC error {code}: {message}")]
    Rpc {
        server: String,
        code: i64,
        message: String,
    },
    #[error("tool provider '{server}' terminated unexpectedly")]
    Terminated { server: String },
    #[error("tool provider '{server}' request cancelled")]
    Cancelled { server: String },
    #[error("tool provider '{server}' did not answer within {timeout_ms} ms")]
    ConnectTimeout { server: String, timeout_ms: u64 },
}

impl ToolInvokeError {
    pub(crate) fn transport(server: &str, message: impl Into<String>) -> Self {
        Self::Transport {
            server: server.to_string(),
            message: message.into(),
        }
    }
}
