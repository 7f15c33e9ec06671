use anyhow::{Context, Result};
use onslaught::cli::output::CROSS;
use onslaught::cli::terminal_output::TerminalReporter;
use onslaught::cli::Cli;
use onslaught::{GateConfig, GateEngine, Project, Session, SubprocessRunner};
use std::fs::File;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// At least one step failed
const EXIT_GATE_FAILED: u8 = 1;

/// The runner could not start
const EXIT_RUNNER_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::from_args();

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_GATE_FAILED),
        Err(e) => {
            eprintln!("{} {:#}", CROSS, e);
            ExitCode::from(EXIT_RUNNER_ERROR)
        }
    }
}

async fn run(cli: &Cli) -> Result<bool> {
    let config = GateConfig::load(cli.config.as_deref()).context("Failed to load runner config")?;
    let project = Project::open(&cli.target)?;

    let results = match &cli.results {
        Some(path) => path.clone(),
        None => Session::default_results_dir(&project)
            .context("Cannot locate the home directory, pass --results")?,
    };
    let session = Session::create(project, &results).context("Failed to prepare results directory")?;

    init_logging(cli, &session.main_log())?;
    info!("Results directory: {}", session.results_dir().display());
    debug!("Parsed opts: {:?}", cli);
    debug!("Runner config: {:?}", config);

    let mut engine = GateEngine::new(SubprocessRunner::new(config.timeout_secs), config.tools.clone());
    let reporter = Arc::new(TerminalReporter::for_stdout());
    let handler = reporter.clone();
    engine.add_event_handler(move |event| handler.on_event(event));

    let report = engine.execute(&session).await;

    reporter.print_report(&report);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(report.passed())
}

/// Console logs go to stderr at the level picked on the command line
/// (`RUST_LOG` wins when set); `main.log` in the results directory gets
/// everything at debug level.
fn init_logging(cli: &Cli, main_log: &Path) -> Result<()> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(cli.log_level()).into())
        .from_env_lossy();

    let file = File::create(main_log)
        .with_context(|| format!("Failed to create {}", main_log.display()))?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(console_filter);
    let logfile = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_filter(LevelFilter::DEBUG);

    tracing_subscriber::registry()
        .with(console)
        .with(logfile)
        .try_init()
        .context("Failed to set logging subscriber")?;

    debug!("Created debug level log in: {}", main_log.display());
    Ok(())
}
