use super::defaults::{DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_PYTHON, DEFAULT_STARTUP_DELAY_MS};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// A tool server reached over stdio: spawned once, spoken to with
/// newline-delimited JSON-RPC.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub name: String,
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawServer {
    name: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
}

pub(crate) fn expand(value: &str) -> String {
    shellexpand::full(value)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

impl From<RawServer> for ServerConfig {
    fn from(raw: RawServer) -> Self {
        let command = PathBuf::from(expand(&raw.command));
        let workdir = raw.workdir.map(|d| PathBuf::from(expand(&d)));
        let args = raw.args.into_iter().map(|arg| expand(&arg)).collect();
        let env = raw
            .env
            .into_iter()
            .map(|(key, value)| (key, expand(&value)))
            .collect();

        Self {
            name: raw.name,
            command,
            args,
            env,
            workdir,
        }
    }
}

/// How tool providers named on the command line are started and reached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Interpreter used for providers given as `.py` scripts.
    pub python: String,
    /// Wait between spawning a provider and opening its SSE stream.
    pub startup_delay_ms: u64,
    /// Upper bound for receiving the SSE `endpoint` event.
    pub connect_timeout_ms: u64,
    pub host: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            python: DEFAULT_PYTHON.to_string(),
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            host: "localhost".to_string(),
        }
    }
}

impl LaunchConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn sse_url(&self, port: u16) -> String {
        format!("http://{}:{port}/sse", self.host)
    }
}
