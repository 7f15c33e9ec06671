//! Test: style and static-analysis findings

use crate::helpers::*;
use onslaught::{StepFailure, StepKind};

#[tokio::test]
async fn test_style_violation_fails_run() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.style",
        1,
        "mypkg/__init__.py:2:1: E302 expected 2 blank lines, found 1\n\
         mypkg/__init__.py:5:80: E501 line too long (91 > 79 characters)\n",
    );

    let result = run_gate(&project, runner).await;

    assert_failed_steps(&result, &[StepKind::Style]);
    assert_eq!(
        result.failure(StepKind::Style),
        Some(StepFailure::Violations { count: 2 })
    );
    let style = result.report.step(StepKind::Style).unwrap();
    assert!(style.output.contains("E501"));
}

#[tokio::test]
async fn test_unused_import_fails_static_analysis_only() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.static-analysis",
        1,
        "mypkg/__init__.py:1:1: F401 'os' imported but unused\n",
    );

    let result = run_gate(&project, runner).await;

    assert!(result.passed(StepKind::Style));
    assert_failed_steps(&result, &[StepKind::StaticAnalysis]);
    assert_eq!(
        result.failure(StepKind::StaticAnalysis),
        Some(StepFailure::Violations { count: 1 })
    );
}

#[tokio::test]
async fn test_later_steps_still_run_after_lint_failure() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean()
        .respond("phase.style", 1, "a.py:1:1: W291 trailing whitespace\n")
        .respond("phase.static-analysis", 1, "a.py:3:5: F821 undefined name 'x'\n");

    let result = run_gate(&project, runner.clone()).await;

    assert_failed_steps(&result, &[StepKind::Style, StepKind::StaticAnalysis]);
    assert!(runner.was_called("phase.setup-sdist"));
    assert!(runner.was_called("phase.unittests"));
    assert!(result.report.coverage().is_some());
}

#[tokio::test]
async fn test_output_with_zero_exit_still_counts() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond("phase.style", 0, "a.py:1:1: E111 indentation\n");

    let result = run_gate(&project, runner).await;

    assert_eq!(
        result.failure(StepKind::Style),
        Some(StepFailure::Violations { count: 1 })
    );
}

#[tokio::test]
async fn test_silent_nonzero_exit_is_infrastructure() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond("phase.style", 2, "");

    let result = run_gate(&project, runner).await;

    assert!(matches!(
        result.failure(StepKind::Style),
        Some(StepFailure::Infrastructure { .. })
    ));
}

#[tokio::test]
async fn test_flake8_crash_is_infrastructure_not_violations() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.style",
        1,
        "There was a critical error during execution of Flake8:\n\
         failed to load plugin \"pycodestyle.E\" due to No module named 'pycodestyle'.\n",
    );

    let result = run_gate(&project, runner).await;

    assert_failed_steps(&result, &[StepKind::Style]);
    match result.failure(StepKind::Style) {
        Some(StepFailure::Infrastructure { message }) => {
            assert!(message.contains("critical error during execution of Flake8"))
        }
        other => panic!("expected infrastructure failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_noise_around_findings_is_not_counted() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.static-analysis",
        1,
        "/usr/lib/python3/site-packages/flake8/plugins.py:3: DeprecationWarning: pkg_resources\n\
         mypkg/__init__.py:1:1: F401 'os' imported but unused\n",
    );

    let result = run_gate(&project, runner).await;

    assert_eq!(
        result.failure(StepKind::StaticAnalysis),
        Some(StepFailure::Violations { count: 1 })
    );
}

#[tokio::test]
async fn test_stderr_noise_with_zero_exit_passes() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.style",
        0,
        "/usr/lib/python3/site-packages/flake8/plugins.py:3: DeprecationWarning: pkg_resources\n",
    );

    let result = run_gate(&project, runner).await;

    assert!(result.passed(StepKind::Style));
    assert_failed_steps(&result, &[]);
}
