//! Subprocess runner - executes tools with output redirected to a log file

use crate::tool::{Invocation, ToolError, ToolOutput, ToolRunner};
use async_trait::async_trait;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs tools as child processes
#[derive(Debug, Clone)]
pub struct SubprocessRunner {
    /// Timeout per invocation in seconds, 0 disables
    timeout_secs: u64,
}

impl SubprocessRunner {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl ToolRunner for SubprocessRunner {
    /// Spawn the tool with stdout and stderr both pointed at the log file so
    /// the log keeps their interleaving, then read the log back.
    ///
    /// # Errors
    /// Returns `ToolError` if:
    /// - The log file cannot be created or read back
    /// - The program does not exist or cannot be spawned
    /// - The program runs past the configured timeout (it is killed)
    async fn run(&self, invocation: &Invocation, log_path: &Path) -> Result<ToolOutput, ToolError> {
        debug!("Running: {}; logfile {}", invocation, log_path.display());

        let log = File::create(log_path)?;
        let log_err = log.try_clone()?;

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(log)
            .stderr(log_err)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ToolError::NotFound {
                    program: invocation.program.clone(),
                },
                _ => ToolError::Spawn {
                    program: invocation.program.clone(),
                    source: e,
                },
            })?;

        let status = if self.timeout_secs > 0 {
            match timeout(Duration::from_secs(self.timeout_secs), child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("{} timed out after {}s, killing", invocation.program, self.timeout_secs);
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill {}: {}", invocation.program, e);
                    }
                    return Err(ToolError::Timeout {
                        program: invocation.program.clone(),
                        secs: self.timeout_secs,
                    });
                }
            }
        } else {
            child.wait().await?
        };

        let bytes = tokio::fs::read(log_path).await?;
        let output = String::from_utf8_lossy(&bytes).into_owned();

        debug!(
            "{} exited with {:?}, {} bytes of output",
            invocation.program,
            status.code(),
            output.len()
        );

        Ok(ToolOutput {
            exit_code: status.code(),
            output,
            log_path: log_path.to_path_buf(),
        })
    }
}
