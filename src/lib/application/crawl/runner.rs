//! Runs the external crawler under a wall-clock limit.
//!
//! On timeout the process gets SIGTERM, then `grace` to exit, then SIGKILL.

use super::error::CrawlError;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// `None` when the process was stopped by a signal.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub log_file: PathBuf,
}

impl CrawlOutcome {
    pub fn succeeded(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

pub struct CrawlRunner {
    pub command: Vec<String>,
    pub workdir: PathBuf,
    pub timeout: Duration,
    pub grace: Duration,
}

impl CrawlRunner {
    /// Run to completion with stdout and stderr appended to `log_file`.
    pub async fn run(&self, log_file: &Path) -> Result<CrawlOutcome, CrawlError> {
        let (program, args) = self.command.split_first().ok_or(CrawlError::EmptyCommand)?;

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| CrawlError::io(log_file, e))?;
        let log_err = log.try_clone().map_err(|e| CrawlError::io(log_file, e))?;

        info!(
            command = self.command.join(" ").as_str(),
            workdir = %self.workdir.display(),
            timeout_secs = self.timeout.as_secs(),
            "starting crawler"
        );
        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CrawlError::Spawn {
                program: program.clone(),
                source,
            })?;

        let (status, timed_out) = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => (status.map_err(|e| CrawlError::io(log_file, e))?, false),
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "crawler exceeded timeout, terminating");
                (self.stop(&mut child).await.map_err(|e| CrawlError::io(log_file, e))?, true)
            }
        };

        let outcome = CrawlOutcome {
            exit_code: status.code(),
            timed_out,
            log_file: log_file.to_path_buf(),
        };
        info!(
            exit_code = outcome.exit_code,
            timed_out = outcome.timed_out,
            "crawler finished"
        );
        Ok(outcome)
    }

    async fn stop(&self, child: &mut Child) -> std::io::Result<ExitStatus> {
        if let Err(err) = terminate(child) {
            debug!(%err, "terminate signal failed");
        }
        match tokio::time::timeout(self.grace, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                warn!(grace_secs = self.grace.as_secs(), "crawler ignored terminate, killing");
                child.kill().await?;
                child.wait().await
            }
        }
    }
}

#[cfg(unix)]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    // SAFETY: plain signal delivery to a child we spawned and still own.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) -> std::io::Result<()> {
    child.start_kill()
}
