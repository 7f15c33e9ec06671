//! Terminal reporter for gate runs
//!
//! Prints one line per gate event while the run is in progress, with a
//! spinner while a step's tools are running when stdout is a terminal, and
//! renders the final report once the run is over.

use crate::cli::output::{
    create_spinner, format_gate_event, format_output, format_step_result, format_verdict, INFO,
};
use crate::core::RunReport;
use crate::execution::GateEvent;
use console::{style, Term};
use indicatif::ProgressBar;
use std::sync::Mutex;

/// Lines of failing tool output shown per step in the summary
const FAILURE_OUTPUT_LINES: usize = 20;

/// Displays gate progress and the final report
pub struct TerminalReporter {
    show_spinner: bool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl TerminalReporter {
    /// # Arguments
    ///
    /// * `interactive` - Whether to animate a spinner while steps run
    pub fn new(interactive: bool) -> Self {
        Self {
            show_spinner: interactive,
            spinner: Mutex::new(None),
        }
    }

    /// Reporter for the current stdout
    pub fn for_stdout() -> Self {
        Self::new(Term::stdout().is_term())
    }

    /// Handle one gate event
    pub fn on_event(&self, event: &GateEvent) {
        let mut spinner = match self.spinner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(active) = spinner.take() {
            active.finish_and_clear();
        }

        println!("{}", format_gate_event(event));

        if let GateEvent::StepStarted { step, .. } = event {
            if self.show_spinner {
                *spinner = Some(create_spinner(format!("{} running...", step)));
            }
        }
    }

    /// Print the per-step summary, coverage, and verdict
    pub fn print_report(&self, report: &RunReport) {
        println!();
        self.print_separator();
        for result in report.steps() {
            println!("{}", format_step_result(result));
            if !result.passed() && !result.output.trim().is_empty() {
                for line in format_output(result.output.trim_end(), FAILURE_OUTPUT_LINES).lines() {
                    println!("    {}", style(line).dim());
                }
            }
        }

        if let Some(coverage) = report.coverage() {
            self.print_separator();
            println!("{}", style("Branch coverage").bold());
            println!("{}", coverage.trim_end());
        }

        self.print_separator();
        println!("{}", format_verdict(report));
        println!(
            "{} Results in {}",
            INFO,
            style(report.results_dir.display()).dim()
        );
    }

    /// A horizontal rule spanning the terminal width
    fn print_separator(&self) {
        // Get terminal width, default to 80 if unavailable
        let width = term_size::dimensions_stdout()
            .map(|(w, _)| w)
            .unwrap_or(80);
        println!("{}", "─".repeat(width));
    }
}
