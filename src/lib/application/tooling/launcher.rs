//! Starts tool providers named on the command line and connects to them.

use super::error::ToolInvokeError;
use super::sse::SseSession;
use crate::config::LaunchConfig;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// A provider script and the port it should listen on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    pub script: PathBuf,
    pub port: u16,
}

impl ProviderSpec {
    pub fn new(script: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            script: script.into(),
            port,
        }
    }

    /// Session label, e.g. `crawl_server:8000`.
    pub fn label(&self) -> String {
        let stem = self
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.script.display().to_string());
        format!("{stem}:{}", self.port)
    }

    fn is_python(&self) -> bool {
        self.script.extension().is_some_and(|ext| ext == "py")
    }
}

pub struct ServerLauncher {
    launch: LaunchConfig,
    log_dir: PathBuf,
    children: Vec<(String, Child)>,
}

impl ServerLauncher {
    pub fn new(launch: LaunchConfig, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            launch,
            log_dir: log_dir.into(),
            children: Vec::new(),
        }
    }

    /// Spawn the provider, give it time to bind, then open its SSE session.
    pub async fn launch(&mut self, spec: &ProviderSpec) -> Result<SseSession, ToolInvokeError> {
        let label = spec.label();
        if !spec.script.exists() {
            return Err(ToolInvokeError::NotConfigured { server: label });
        }

        let child = self.spawn(spec, &label)?;
        self.children.push((label.clone(), child));

        debug!(
            server = label.as_str(),
            delay_ms = self.launch.startup_delay_ms,
            "waiting for tool provider to start"
        );
        tokio::time::sleep(self.launch.startup_delay()).await;

        let url = self.launch.sse_url(spec.port);
        SseSession::connect(label, &url, self.launch.connect_timeout()).await
    }

    fn spawn(&self, spec: &ProviderSpec, label: &str) -> Result<Child, ToolInvokeError> {
        let spawn_error = |source: std::io::Error| ToolInvokeError::Spawn {
            server: label.to_string(),
            source,
        };

        let mut command = if spec.is_python() {
            let mut command = Command::new(&self.launch.python);
            command.arg(&spec.script);
            command
        } else {
            Command::new(&spec.script)
        };
        command.arg(spec.port.to_string());

        let log_path = self.provider_log_path(spec);
        fs::create_dir_all(&self.log_dir).map_err(spawn_error)?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(spawn_error)?;
        let log_err = log.try_clone().map_err(spawn_error)?;

        command
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true);

        let child = command.spawn().map_err(spawn_error)?;
        info!(
            server = label,
            pid = child.id().unwrap_or_default(),
            log = %log_path.display(),
            "spawned tool provider"
        );
        Ok(child)
    }

    fn provider_log_path(&self, spec: &ProviderSpec) -> PathBuf {
        let stem = spec
            .script
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "provider".to_string());
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.log_dir.join(format!("{stem}_{}_{stamp}.log", spec.port))
    }

    /// Kill every spawned provider.
    pub async fn shutdown(&mut self) {
        for (label, mut child) in self.children.drain(..) {
            match child.kill().await {
                Ok(()) => debug!(server = label.as_str(), "stopped tool provider"),
                Err(err) => warn!(server = label.as_str(), %err, "failed to stop tool provider"),
            }
        }
    }
}
