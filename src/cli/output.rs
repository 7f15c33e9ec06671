//! CLI output formatting

use crate::{
    core::{RunReport, StepOutcome, StepResult},
    execution::GateEvent,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a step's tools run
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a step outcome for display
pub fn format_outcome(outcome: &StepOutcome) -> String {
    match outcome {
        StepOutcome::Passed => style("PASSED").green().to_string(),
        StepOutcome::Failed(_) => style("FAILED").red().to_string(),
    }
}

/// One summary line for a finished step
pub fn format_step_result(result: &StepResult) -> String {
    let duration = result
        .finished_at
        .signed_duration_since(result.started_at)
        .to_std()
        .unwrap_or_default();
    match result.failure() {
        None => format!(
            "{} {:<16} {} {}",
            CHECK,
            result.step.to_string(),
            format_outcome(&result.outcome),
            style(format_duration(duration)).dim()
        ),
        Some(failure) => format!(
            "{} {:<16} {} {}",
            CROSS,
            result.step.to_string(),
            format_outcome(&result.outcome),
            style(failure).red()
        ),
    }
}

/// Format a gate event for display
pub fn format_gate_event(event: &GateEvent) -> String {
    match event {
        GateEvent::RunStarted { run_id, target } => format!(
            "{} Onslaught on {} ({})",
            ROCKET,
            style(target.display()).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        GateEvent::StepStarted { step, index, total } => format!(
            "{} [{}/{}] {}",
            SPINNER,
            style(index).cyan(),
            style(total).dim(),
            style(step).cyan()
        ),
        GateEvent::StepFinished { step, outcome } => match outcome {
            StepOutcome::Passed => format!("{} {}", CHECK, style(step).green()),
            StepOutcome::Failed(failure) => {
                format!("{} {}: {}", CROSS, style(step).red(), style(failure).dim())
            }
        },
        GateEvent::StepBlocked { step, dependency } => format!(
            "{} {} skipped: {} failed",
            WARN,
            style(step).yellow(),
            dependency
        ),
        GateEvent::RunCompleted { run_id, passed } => {
            let status = if *passed {
                style("passed").green()
            } else {
                style("failed").red()
            };
            format!(
                "{} Run ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status
            )
        }
    }
}

/// Final verdict line
pub fn format_verdict(report: &RunReport) -> String {
    let target = report.package.clone().unwrap_or_else(|| report.target.display().to_string());
    if report.passed() {
        format!("{} {} {}", CHECK, style(target).bold(), style("passed every check").green())
    } else {
        format!(
            "{} {} {} ({} of {} steps)",
            CROSS,
            style(target).bold(),
            style("failed").red(),
            report.failed_steps().count(),
            report.steps().len()
        )
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
