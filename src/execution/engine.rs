//! Main execution engine - runs the fixed steps in order and aggregates them

use crate::{
    core::{config::ToolPaths, RunContext, RunReport, StepKind, StepOutcome, StepResult},
    execution::{session::Session, StepExecutor},
    tool::ToolRunner,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events that can occur during a gate run
#[derive(Debug, Clone)]
pub enum GateEvent {
    RunStarted {
        run_id: Uuid,
        target: PathBuf,
    },
    StepStarted {
        step: StepKind,
        index: usize,
        total: usize,
    },
    StepFinished {
        step: StepKind,
        outcome: StepOutcome,
    },
    StepBlocked {
        step: StepKind,
        dependency: StepKind,
    },
    RunCompleted {
        run_id: Uuid,
        passed: bool,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(&GateEvent) + Send + Sync>;

/// Runs every step exactly once, in order
pub struct GateEngine<R> {
    executor: StepExecutor<R>,
    event_handlers: Vec<EventHandler>,
}

impl<R: ToolRunner> GateEngine<R> {
    pub fn new(runner: R, tools: ToolPaths) -> Self {
        Self {
            executor: StepExecutor::new(runner, tools),
            event_handlers: Vec::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(&GateEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    fn emit_event(&self, event: GateEvent) {
        for handler in &self.event_handlers {
            handler(&event);
        }
    }

    /// Execute the whole gate against the session's project
    ///
    /// Later steps still run after a failure so one run surfaces every
    /// problem; only a step whose dependency failed is skipped and recorded
    /// as blocked. The isolated environment is torn down and anything the
    /// tools left in the project is removed before returning.
    pub async fn execute(&self, session: &Session) -> RunReport {
        let project = session.project();
        let mut report = RunReport::new(project.path(), session.results_dir());
        let snapshot = project.snapshot();
        let mut context = RunContext::new();

        info!(
            "Starting gate run {} on {}",
            report.run_id,
            project.path().display()
        );
        self.emit_event(GateEvent::RunStarted {
            run_id: report.run_id,
            target: project.path().to_path_buf(),
        });

        let total = StepKind::ALL.len();
        for (i, step) in StepKind::ALL.into_iter().enumerate() {
            let blocked_on = step
                .dependency()
                .filter(|dep| !report.step(*dep).is_some_and(StepResult::passed));

            let result = match blocked_on {
                Some(dependency) => {
                    warn!("Skipping {}: {} failed", step, dependency);
                    self.emit_event(GateEvent::StepBlocked { step, dependency });
                    StepResult::blocked(step, dependency)
                }
                None => {
                    self.emit_event(GateEvent::StepStarted {
                        step,
                        index: i + 1,
                        total,
                    });
                    let result = self.executor.execute(step, session, &mut context).await;
                    self.emit_event(GateEvent::StepFinished {
                        step,
                        outcome: result.outcome.clone(),
                    });
                    result
                }
            };
            report.record(result);
        }

        report.package = context.package.clone();
        session.teardown();
        let removed = snapshot.restore();
        if !removed.is_empty() {
            warn!("Removed {} path(s) the tools left in the project", removed.len());
        }
        report.finish();

        if let Err(e) = report.write_json(&session.report_path()) {
            warn!("Could not write {}: {}", session.report_path().display(), e);
        }

        info!(
            "Gate run {} finished: {} ({} failed step(s))",
            report.run_id,
            if report.passed() { "passed" } else { "failed" },
            report.failed_steps().count()
        );
        self.emit_event(GateEvent::RunCompleted {
            run_id: report.run_id,
            passed: report.passed(),
        });

        report
    }
}
