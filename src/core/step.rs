//! Step domain model

use crate::core::state::{StepFailure, StepOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The fixed checks, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Style,
    StaticAnalysis,
    Packaging,
    Test,
}

impl StepKind {
    /// Every step in the order the gate runs them
    pub const ALL: [StepKind; 4] = [
        StepKind::Style,
        StepKind::StaticAnalysis,
        StepKind::Packaging,
        StepKind::Test,
    ];

    /// Short identifier used in log file names
    pub fn id(&self) -> &'static str {
        match self {
            StepKind::Style => "style",
            StepKind::StaticAnalysis => "static-analysis",
            StepKind::Packaging => "packaging",
            StepKind::Test => "test",
        }
    }

    /// Step that must pass before this one can run
    pub fn dependency(&self) -> Option<StepKind> {
        match self {
            StepKind::Test => Some(StepKind::Packaging),
            _ => None,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Style => "Style check",
            StepKind::StaticAnalysis => "Static analysis",
            StepKind::Packaging => "Packaging",
            StepKind::Test => "Unit tests",
        };
        f.write_str(name)
    }
}

/// Outcome of one gate step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step: StepKind,

    pub outcome: StepOutcome,

    /// Tool output relevant to the outcome
    pub output: String,

    /// Log files written while running the step, in order
    pub logs: Vec<PathBuf>,

    /// Textual branch-coverage report (test step only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<String>,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.outcome.is_passed()
    }

    pub fn failure(&self) -> Option<&StepFailure> {
        match &self.outcome {
            StepOutcome::Passed => None,
            StepOutcome::Failed(failure) => Some(failure),
        }
    }

    /// Result for a step that was never executed
    pub fn blocked(step: StepKind, dependency: StepKind) -> Self {
        let now = Utc::now();
        Self {
            step,
            outcome: StepOutcome::Failed(StepFailure::Blocked { dependency }),
            output: String::new(),
            logs: Vec::new(),
            coverage: None,
            started_at: now,
            finished_at: now,
        }
    }
}
