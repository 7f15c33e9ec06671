//! Test utility functions for onslaught

#![allow(dead_code)]

use async_trait::async_trait;
use onslaught::core::config::ToolPaths;
use onslaught::{
    GateEngine, GateEvent, Invocation, Project, RunReport, Session, StepFailure, StepKind, ToolError,
    ToolOutput, ToolRunner,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Coverage table printed by the mock `coverage report`
pub const COVERAGE_TABLE: &str = "\
Name                                                              Stmts   Miss Branch BrPart  Cover
----------------------------------------------------------------------------------------------------
/r/venv/lib/python3.11/site-packages/mypkg/__init__.py               4      0      2      0   100%
";

/// What the mock returns for one tool label
#[derive(Debug, Clone)]
pub enum MockResponse {
    Exit { code: i32, output: String },
    NotFound,
}

/// Mock tool runner that returns scripted results keyed by log label
///
/// Labels are the `<label>` part of `NN.<label>.log`. Unscripted labels
/// succeed with no output. Successful runs of the sdist build, virtualenv,
/// and coverage html commands leave behind the files the real tools would.
#[derive(Clone, Default)]
pub struct MockToolRunner {
    responses: Arc<HashMap<String, MockResponse>>,
    calls: Arc<Mutex<Vec<(String, Invocation)>>>,
    side_effects: Arc<Mutex<Vec<(String, PathBuf)>>>,
}

impl MockToolRunner {
    /// A runner under which a project passes every check
    pub fn clean() -> Self {
        Self::default()
            .respond("setup-name", 0, "mypkg\n")
            .respond("phase.setup-sdist", 0, "running sdist\ncreating mypkg-0.1\n")
            .respond("phase.unittests", 0, "mypkg.test_core ... [OK]\n\nPASSED (successes=3)\n")
            .respond("coverage-report-stdout", 0, COVERAGE_TABLE)
    }

    pub fn respond(mut self, label: &str, code: i32, output: &str) -> Self {
        Arc::make_mut(&mut self.responses).insert(
            label.to_string(),
            MockResponse::Exit {
                code,
                output: output.to_string(),
            },
        );
        self
    }

    pub fn missing(mut self, label: &str) -> Self {
        Arc::make_mut(&mut self.responses).insert(label.to_string(), MockResponse::NotFound);
        self
    }

    /// Create `path` (a directory) whenever `label` runs
    pub fn touch_on(self, label: &str, path: PathBuf) -> Self {
        self.side_effects
            .lock()
            .unwrap()
            .push((label.to_string(), path));
        self
    }

    /// Labels invoked so far, in order
    pub fn labels(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(l, _)| l.clone()).collect()
    }

    pub fn invocation(&self, label: &str) -> Option<Invocation> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, inv)| inv.clone())
    }

    pub fn was_called(&self, label: &str) -> bool {
        self.labels().iter().any(|l| l == label)
    }
}

fn label_of(log_path: &Path) -> String {
    let name = log_path.file_name().unwrap().to_string_lossy();
    let name = name.strip_suffix(".log").unwrap();
    name.split_once('.').unwrap().1.to_string()
}

#[async_trait]
impl ToolRunner for MockToolRunner {
    async fn run(&self, invocation: &Invocation, log_path: &Path) -> Result<ToolOutput, ToolError> {
        let label = label_of(log_path);
        self.calls
            .lock()
            .unwrap()
            .push((label.clone(), invocation.clone()));

        let (code, output) = match self.responses.get(&label) {
            Some(MockResponse::NotFound) => {
                return Err(ToolError::NotFound {
                    program: invocation.program.clone(),
                })
            }
            Some(MockResponse::Exit { code, output }) => (*code, output.clone()),
            None => (0, String::new()),
        };
        std::fs::write(log_path, &output)?;

        if code == 0 {
            match label.as_str() {
                "virtualenv" => std::fs::create_dir_all(Path::new(&invocation.args[0]).join("bin"))?,
                "phase.setup-sdist" => {
                    let dist = Path::new(invocation.flag_value("--dist-dir").unwrap());
                    std::fs::write(dist.join("mypkg-0.1.tar.gz"), b"sdist")?;
                }
                "coverage-report-html" => {
                    let dir = Path::new(invocation.flag_value("--directory").unwrap());
                    std::fs::create_dir_all(dir)?;
                    std::fs::write(
                        dir.join("index.html"),
                        "<td>/r/venv/lib/python3.11/site-packages/mypkg/__init__.py</td>",
                    )?;
                }
                _ => {}
            }
        }
        for (effect_label, path) in self.side_effects.lock().unwrap().iter() {
            if *effect_label == label {
                std::fs::create_dir_all(path)?;
            }
        }

        Ok(ToolOutput {
            exit_code: Some(code),
            output,
            log_path: log_path.to_path_buf(),
        })
    }
}

/// A throwaway Python project and results directory
pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let proj = dir.path().join("mypkg-src");
        std::fs::create_dir_all(proj.join("mypkg")).unwrap();
        std::fs::write(
            proj.join("setup.py"),
            "from setuptools import setup\nsetup(name='mypkg', packages=['mypkg'])\n",
        )
        .unwrap();
        std::fs::write(proj.join("mypkg/__init__.py"), "def f():\n    return 1\n").unwrap();
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("mypkg-src").canonicalize().unwrap()
    }

    pub fn results(&self) -> PathBuf {
        self.dir.path().join("results")
    }

    /// Sorted relative paths of every file and directory in the project
    pub fn listing(&self) -> Vec<PathBuf> {
        let root = self.path();
        let mut paths: Vec<PathBuf> = walkdir::WalkDir::new(&root)
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().path().strip_prefix(&root).unwrap().to_path_buf())
            .collect();
        paths.sort();
        paths
    }
}

/// Result of running the gate under a mock runner
pub struct GateTestResult {
    pub report: RunReport,
    pub events: Vec<GateEvent>,
    pub session: Session,
}

impl GateTestResult {
    pub fn failure(&self, step: StepKind) -> Option<StepFailure> {
        self.report.step(step).and_then(|s| s.failure().cloned())
    }

    pub fn passed(&self, step: StepKind) -> bool {
        self.report.step(step).is_some_and(|s| s.passed())
    }

    /// Outcomes in step order, for comparing runs
    pub fn outcomes(&self) -> Vec<(StepKind, Option<StepFailure>)> {
        self.report
            .steps()
            .iter()
            .map(|s| (s.step, s.failure().cloned()))
            .collect()
    }
}

/// Run the full gate against `project` with `runner`
pub async fn run_gate(project: &TestProject, runner: MockToolRunner) -> GateTestResult {
    let session = Session::create(Project::open(project.path()).unwrap(), &project.results()).unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let mut engine = GateEngine::new(runner, ToolPaths::default());
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event.clone()));

    let report = engine.execute(&session).await;
    let events = events.lock().unwrap().clone();

    GateTestResult {
        report,
        events,
        session,
    }
}

/// Assert only the listed steps failed
pub fn assert_failed_steps(result: &GateTestResult, expected: &[StepKind]) {
    let failed: Vec<StepKind> = result.report.failed_steps().map(|s| s.step).collect();
    assert_eq!(failed, expected, "unexpected failed steps");
    assert_eq!(result.report.passed(), expected.is_empty());
}
