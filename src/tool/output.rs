//! Tool output and error types

use std::path::PathBuf;
use thiserror::Error;

/// Error types for tool invocation
///
/// These are infrastructure failures: the tool never produced a verdict.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool not found: {program}")]
    NotFound { program: String },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {secs} seconds")]
    Timeout { program: String, secs: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of a finished tool
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,

    /// Combined stdout and stderr
    pub output: String,

    /// Log file holding the same text
    pub log_path: PathBuf,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Non-blank output lines
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines().filter(|l| !l.trim().is_empty())
    }
}
