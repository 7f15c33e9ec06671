//! Run report - aggregate of all step results

use crate::core::step::{StepKind, StepResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Aggregate outcome of one gate run
///
/// The overall verdict is derived from the step results; there is no way to
/// set it independently. A loaded report recomputes it from its steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StoredReport")]
pub struct RunReport {
    /// Unique run ID
    pub run_id: Uuid,

    /// Project that was checked
    pub target: PathBuf,

    /// Package name from the project metadata, once known
    pub package: Option<String>,

    /// Where logs and reports were written
    pub results_dir: PathBuf,

    pub started_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    passed: bool,

    steps: Vec<StepResult>,
}

impl RunReport {
    pub fn new(target: &Path, results_dir: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target: target.to_path_buf(),
            package: None,
            results_dir: results_dir.to_path_buf(),
            started_at: Utc::now(),
            completed_at: None,
            passed: true,
            steps: Vec::new(),
        }
    }

    /// Record a finished step
    pub fn record(&mut self, result: StepResult) {
        self.passed &= result.passed();
        self.steps.push(result);
    }

    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// True iff every recorded step passed
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.step == kind)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepResult> {
        self.steps.iter().filter(|s| !s.passed())
    }

    /// Coverage report text from the test step
    pub fn coverage(&self) -> Option<&str> {
        self.step(StepKind::Test).and_then(|s| s.coverage.as_deref())
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// `report.json` as read back; any stored verdict is ignored
#[derive(Deserialize)]
struct StoredReport {
    run_id: Uuid,
    target: PathBuf,
    package: Option<String>,
    results_dir: PathBuf,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    steps: Vec<StepResult>,
}

impl From<StoredReport> for RunReport {
    fn from(stored: StoredReport) -> Self {
        let passed = stored.steps.iter().all(StepResult::passed);
        Self {
            run_id: stored.run_id,
            target: stored.target,
            package: stored.package,
            results_dir: stored.results_dir,
            started_at: stored.started_at,
            completed_at: stored.completed_at,
            passed,
            steps: stored.steps,
        }
    }
}
