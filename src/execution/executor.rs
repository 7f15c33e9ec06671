//! Step executor - runs one fixed check against the project

use crate::{
    core::{
        config::{ToolPaths, TEST_DEPENDENCIES},
        warnings::scan_warnings,
        RunContext, StepFailure, StepKind, StepOutcome, StepResult,
    },
    execution::{
        coverage::{VenvPathTidier, TEXT_ELLIPSIS},
        session::Session,
    },
    tool::{Invocation, ToolOutput, ToolRunner},
};
use chrono::Utc;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Inline `# noqa` comments must not hide findings
const DISABLE_NOQA: &str = "--disable-noqa";

/// pycodestyle checks with flake8's default ignore list left in place
const STYLE_FLAGS: [&str; 2] = [DISABLE_NOQA, "--extend-ignore=F,C90"];

/// pyflakes checks only
const STATIC_ANALYSIS_FLAGS: [&str; 2] = [DISABLE_NOQA, "--select=F"];

/// `path:row:col: CODE message`
static FLAKE8_REPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+:\d+:\d+: [A-Z]+\d+ ").expect("static regex"));

/// Bookkeeping for the invocations made by one step
struct StepRun<'a> {
    session: &'a Session,
    logs: Vec<PathBuf>,
    output: String,
    coverage: Option<String>,
}

impl<'a> StepRun<'a> {
    fn new(session: &'a Session) -> Self {
        Self {
            session,
            logs: Vec::new(),
            output: String::new(),
            coverage: None,
        }
    }

    /// Run one tool; failing to run it at all is an infrastructure failure
    async fn run<R: ToolRunner + ?Sized>(
        &mut self,
        runner: &R,
        label: &str,
        invocation: &Invocation,
    ) -> Result<ToolOutput, StepFailure> {
        let log_path = self.session.next_log_path(label);
        self.logs.push(log_path.clone());

        match runner.run(invocation, &log_path).await {
            Ok(output) => {
                self.output = output.output.clone();
                Ok(output)
            }
            Err(e) => {
                warn!("{}: {}", label, e);
                self.output = e.to_string();
                Err(StepFailure::infrastructure(format!("{}: {}", label, e)))
            }
        }
    }
}

/// Executes the fixed steps
pub struct StepExecutor<R> {
    runner: R,
    tools: ToolPaths,
}

impl<R: ToolRunner> StepExecutor<R> {
    pub fn new(runner: R, tools: ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// Execute a step and return its result
    pub async fn execute(
        &self,
        step: StepKind,
        session: &Session,
        context: &mut RunContext,
    ) -> StepResult {
        info!("Test Phase {:<18} running...", step.id());
        let started_at = Utc::now();
        let mut run = StepRun::new(session);

        let result = match step {
            StepKind::Style => self.lint(&mut run, "phase.style", &STYLE_FLAGS).await,
            StepKind::StaticAnalysis => {
                self.lint(&mut run, "phase.static-analysis", &STATIC_ANALYSIS_FLAGS)
                    .await
            }
            StepKind::Packaging => self.package(&mut run, context).await,
            StepKind::Test => self.unit_test(&mut run, context).await,
        };

        let outcome = match result {
            Ok(()) => {
                info!("Test Phase {:<18} - passed.", step.id());
                StepOutcome::Passed
            }
            Err(failure) => {
                warn!("Test Phase {:<18} - FAILED: {}", step.id(), failure);
                StepOutcome::Failed(failure)
            }
        };

        StepResult {
            step,
            outcome,
            output: run.output,
            logs: run.logs,
            coverage: run.coverage,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Style and static analysis: any reported finding is a violation
    async fn lint(&self, run: &mut StepRun<'_>, label: &str, flags: &[&str]) -> Result<(), StepFailure> {
        let session = run.session;
        let inv = Invocation::new(&self.tools.flake8, session.workdir())
            .args(flags)
            .arg(session.project().path());
        let out = run.run(&self.runner, label, &inv).await?;

        let (findings, other): (Vec<&str>, Vec<&str>) =
            out.lines().partition(|line| is_violation_line(line));
        if !findings.is_empty() {
            return Err(StepFailure::Violations {
                count: findings.len(),
            });
        }
        if !out.success() {
            let detail = other.first().map(|line| line.trim()).unwrap_or("no output");
            return Err(StepFailure::infrastructure(format!(
                "{} exited with {:?} without reporting violations: {}",
                self.tools.flake8, out.exit_code, detail
            )));
        }
        for line in other {
            debug!("{}: ignoring output: {}", label, line);
        }
        Ok(())
    }

    /// Build an sdist from a private copy of the project and install it into
    /// a fresh virtualenv
    async fn package(&self, run: &mut StepRun<'_>, context: &mut RunContext) -> Result<(), StepFailure> {
        let session = run.session;
        let source = session
            .copy_source()
            .map_err(StepFailure::infrastructure)?;

        let package = self.read_package_name(run, &source).await?;
        info!("Package name: {}", package);
        context.package = Some(package);

        self.prepare_virtualenv(run).await?;

        let dist = session.dist_dir();
        std::fs::create_dir_all(&dist).map_err(|e| {
            StepFailure::infrastructure(format!("create {}: {}", dist.display(), e))
        })?;

        // setup.py sdist run from another directory builds a tarball without
        // the sources, so it runs inside the copy.
        let sdist = Invocation::new(session.venv_bin("python"), &source)
            .arg(source.join("setup.py"))
            .args(["sdist", "--dist-dir"])
            .arg(&dist);
        let out = run.run(&self.runner, "phase.setup-sdist", &sdist).await?;
        if !out.success() {
            return Err(StepFailure::BuildFailed {
                exit_code: out.exit_code,
            });
        }

        let warnings = scan_warnings(&out.output);
        if !warnings.is_empty() {
            for line in &warnings {
                warn!("sdist warning: {}", line);
            }
            run.output = warnings.join("\n");
            return Err(StepFailure::BuildWarnings { lines: warnings });
        }

        let artifact = find_artifact(&dist)?;
        debug!("Generated sdist: {}", artifact.display());

        let install = Invocation::new(session.venv_bin("pip"), session.workdir())
            .args(["--verbose", "install"])
            .arg(&artifact);
        let out = run.run(&self.runner, "phase.install-sdist", &install).await?;
        if !out.success() {
            return Err(StepFailure::InstallFailed {
                exit_code: out.exit_code,
            });
        }

        context.sdist = Some(artifact);
        Ok(())
    }

    async fn read_package_name(&self, run: &mut StepRun<'_>, source: &Path) -> Result<String, StepFailure> {
        let inv = Invocation::new(&self.tools.python, source)
            .arg(source.join("setup.py"))
            .arg("--name");
        let out = run.run(&self.runner, "setup-name", &inv).await?;
        if !out.success() {
            return Err(StepFailure::infrastructure(format!(
                "could not read package name (exit code {:?})",
                out.exit_code
            )));
        }
        // setup.py may print notices before the name.
        out.lines()
            .last()
            .map(|name| name.trim().to_string())
            .ok_or_else(|| StepFailure::infrastructure("setup.py --name printed nothing"))
    }

    async fn prepare_virtualenv(&self, run: &mut StepRun<'_>) -> Result<(), StepFailure> {
        let session = run.session;
        debug!("Preparing virtualenv.");
        let inv = Invocation::new(&self.tools.virtualenv, session.workdir()).arg(session.venv());
        let out = run.run(&self.runner, "virtualenv", &inv).await?;
        if !out.success() {
            return Err(StepFailure::infrastructure(format!(
                "virtualenv creation failed (exit code {:?})",
                out.exit_code
            )));
        }

        for spec in TEST_DEPENDENCIES {
            let name = spec.split_whitespace().next().unwrap_or(spec);
            let inv = Invocation::new(session.venv_bin("pip"), session.workdir())
                .args(["--verbose", "install", spec]);
            let out = run
                .run(&self.runner, &format!("pip-install.{}", name), &inv)
                .await?;
            if !out.success() {
                return Err(StepFailure::infrastructure(format!(
                    "installing {} failed (exit code {:?})",
                    spec, out.exit_code
                )));
            }
        }
        Ok(())
    }

    /// Run trial under branch coverage against the installed package, then
    /// produce the coverage reports whatever the test outcome
    async fn unit_test(&self, run: &mut StepRun<'_>, context: &RunContext) -> Result<(), StepFailure> {
        let session = run.session;
        let package = match (&context.package, context.has_installed_artifact()) {
            (Some(package), true) => package.clone(),
            _ => {
                return Err(StepFailure::infrastructure(
                    "no installed package to test",
                ))
            }
        };
        let tidier = VenvPathTidier::new(&package).map_err(StepFailure::infrastructure)?;

        let inv = Invocation::new(session.venv_bin("coverage"), session.workdir())
            .args(["run", "--branch", "--source", package.as_str()])
            .arg(session.venv_bin("trial"))
            .arg(&package);
        let out = run.run(&self.runner, "phase.unittests", &inv).await?;

        let patched = tidier.tidy(&out.output, &session.project().path().to_string_lossy());
        let patched_log = patched_log_path(&out.log_path);
        if let Err(e) = std::fs::write(&patched_log, &patched) {
            warn!("Could not write {}: {}", patched_log.display(), e);
        } else {
            run.logs.push(patched_log);
        }

        let tests = if out.success() {
            Ok(())
        } else {
            Err(StepFailure::TestsFailed {
                exit_code: out.exit_code,
            })
        };

        let report = self.coverage_report(run, &tidier).await;
        run.output = patched;
        match report {
            Ok(text) => {
                info!("Coverage:\n{}", text);
                run.coverage = Some(text);
                tests
            }
            Err(failure) => tests.and(Err(failure)),
        }
    }

    async fn coverage_report(&self, run: &mut StepRun<'_>, tidier: &VenvPathTidier) -> Result<String, StepFailure> {
        let session = run.session;
        let raw = session.coverage_raw_dir();
        let nice = session.coverage_dir();
        info!("Generating HTML coverage reports in: {}", nice.display());

        let html = Invocation::new(session.venv_bin("coverage"), session.workdir())
            .args(["html", "--directory"])
            .arg(&raw);
        let out = run.run(&self.runner, "coverage-report-html", &html).await?;
        if !out.success() {
            return Err(StepFailure::infrastructure(format!(
                "coverage html failed (exit code {:?})",
                out.exit_code
            )));
        }
        debug!("Editing coverage report paths {} -> {}", raw.display(), nice.display());
        tidier
            .tidy_html_report(&raw, &nice)
            .map_err(|e| StepFailure::infrastructure(format!("tidy coverage report: {}", e)))?;

        let text = Invocation::new(session.venv_bin("coverage"), session.workdir()).arg("report");
        let out = run.run(&self.runner, "coverage-report-stdout", &text).await?;
        if !out.success() {
            return Err(StepFailure::infrastructure(format!(
                "coverage report failed (exit code {:?})",
                out.exit_code
            )));
        }
        Ok(tidier.tidy(&out.output, TEXT_ELLIPSIS))
    }
}

fn is_violation_line(line: &str) -> bool {
    FLAKE8_REPORT.is_match(line)
}

/// The single file the sdist build left in `dist`
fn find_artifact(dist: &Path) -> Result<PathBuf, StepFailure> {
    let entries = std::fs::read_dir(dist)
        .map_err(|e| StepFailure::infrastructure(format!("read {}: {}", dist.display(), e)))?;
    let mut artifacts: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();

    match artifacts.len() {
        1 => Ok(artifacts.remove(0)),
        n => Err(StepFailure::infrastructure(format!(
            "expected one sdist in {}, found {}",
            dist.display(),
            n
        ))),
    }
}

/// `NN.phase.unittests.log` -> `NN.phase.unittests.log.patched`
fn patched_log_path(log: &Path) -> PathBuf {
    let mut name = log.file_name().unwrap_or_default().to_os_string();
    name.push(".patched");
    log.with_file_name(name)
}
