//! Step outcome models

use crate::core::step::StepKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a step passed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "failure", rename_all = "lowercase")]
pub enum StepOutcome {
    Passed,
    Failed(StepFailure),
}

impl StepOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, StepOutcome::Passed)
    }
}

/// Why a step failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepFailure {
    /// Style or static-analysis findings
    Violations { count: usize },

    /// Warning-marked lines in the sdist build log
    BuildWarnings { lines: Vec<String> },

    /// The sdist build exited non-zero
    BuildFailed { exit_code: Option<i32> },

    /// Installing the sdist into the virtualenv failed
    InstallFailed { exit_code: Option<i32> },

    /// At least one unit test failed
    TestsFailed { exit_code: Option<i32> },

    /// The step could not do its work (missing tool, timeout, I/O)
    Infrastructure { message: String },

    /// Not executed because an earlier step failed
    Blocked { dependency: StepKind },
}

impl StepFailure {
    pub fn infrastructure(message: impl fmt::Display) -> Self {
        StepFailure::Infrastructure {
            message: message.to_string(),
        }
    }
}

fn exit_code_text(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepFailure::Violations { count } => write!(f, "{} violation(s) reported", count),
            StepFailure::BuildWarnings { lines } => {
                write!(f, "sdist build emitted {} warning(s)", lines.len())
            }
            StepFailure::BuildFailed { exit_code } => {
                write!(f, "sdist build failed ({})", exit_code_text(exit_code))
            }
            StepFailure::InstallFailed { exit_code } => {
                write!(f, "sdist install failed ({})", exit_code_text(exit_code))
            }
            StepFailure::TestsFailed { exit_code } => {
                write!(f, "unit tests failed ({})", exit_code_text(exit_code))
            }
            StepFailure::Infrastructure { message } => write!(f, "{}", message),
            StepFailure::Blocked { dependency } => {
                write!(f, "not run: {} failed", dependency)
            }
        }
    }
}
