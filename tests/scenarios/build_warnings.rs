//! Test: packaging step policy

use crate::helpers::*;
use onslaught::{GateEvent, StepFailure, StepKind};

const SDIST_WITH_WARNING: &str = "running sdist\nwarning: deprecated option\ncreating mypkg-0.1\n";

#[tokio::test]
async fn test_build_warning_fails_despite_zero_exit() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond("phase.setup-sdist", 0, SDIST_WITH_WARNING);

    let result = run_gate(&project, runner.clone()).await;

    assert_failed_steps(&result, &[StepKind::Packaging, StepKind::Test]);
    assert_eq!(
        result.failure(StepKind::Packaging),
        Some(StepFailure::BuildWarnings {
            lines: vec!["warning: deprecated option".to_string()],
        })
    );
    // The warning stops the step before the install
    assert!(!runner.was_called("phase.install-sdist"));
}

#[tokio::test]
async fn test_packaging_failure_blocks_test_step() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond("phase.setup-sdist", 0, SDIST_WITH_WARNING);

    let result = run_gate(&project, runner.clone()).await;

    assert_eq!(
        result.failure(StepKind::Test),
        Some(StepFailure::Blocked {
            dependency: StepKind::Packaging,
        })
    );
    assert!(!runner.was_called("phase.unittests"));
    assert!(!runner.was_called("coverage-report-html"));
    assert!(result.report.coverage().is_none());
    assert!(result.events.iter().any(|e| matches!(
        e,
        GateEvent::StepBlocked {
            step: StepKind::Test,
            dependency: StepKind::Packaging,
        }
    )));
}

#[tokio::test]
async fn test_warning_detection_is_idempotent() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond("phase.setup-sdist", 0, SDIST_WITH_WARNING);

    let first = run_gate(&project, runner.clone()).await;
    let second = run_gate(&project, runner).await;

    assert_eq!(first.outcomes(), second.outcomes());
    assert!(!second.passed(StepKind::Packaging));
}

#[tokio::test]
async fn test_python_warning_category_in_build_log() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.setup-sdist",
        0,
        "/usr/lib/python3/dist-packages/setuptools/dist.py:285: UserWarning: Unknown distribution option: 'tests_require'\nrunning sdist\n",
    );

    let result = run_gate(&project, runner).await;

    assert!(matches!(
        result.failure(StepKind::Packaging),
        Some(StepFailure::BuildWarnings { ref lines }) if lines.len() == 1
    ));
}

#[tokio::test]
async fn test_build_exit_failure() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond("phase.setup-sdist", 1, "error: invalid command 'sdist'\n");

    let result = run_gate(&project, runner).await;

    assert_eq!(
        result.failure(StepKind::Packaging),
        Some(StepFailure::BuildFailed { exit_code: Some(1) })
    );
}

#[tokio::test]
async fn test_install_failure() {
    let project = TestProject::new();
    let runner = MockToolRunner::clean().respond(
        "phase.install-sdist",
        1,
        "ERROR: Could not install packages due to an OSError\n",
    );

    let result = run_gate(&project, runner.clone()).await;

    assert_eq!(
        result.failure(StepKind::Packaging),
        Some(StepFailure::InstallFailed { exit_code: Some(1) })
    );
    assert!(!runner.was_called("phase.unittests"));
}
