//! Command-line interface

pub mod output;
pub mod terminal_output;

use clap::{ArgGroup, Parser};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::Level;

/// Run the target python project through a battery of tests.
///
/// There are deliberately no options to skip or tune individual checks.
#[derive(Debug, Parser, Clone)]
#[command(name = "onslaught")]
#[command(version)]
#[command(about = "Run the target python project through a battery of tests.", long_about = None)]
#[command(group(ArgGroup::new("loglevel").args(["quiet", "debug"])))]
pub struct Cli {
    /// Target python source.
    #[arg(value_name = "TARGET", default_value = ".")]
    pub target: PathBuf,

    /// Only log warnings and errors.
    #[arg(long)]
    pub quiet: bool,

    /// Log everything.
    #[arg(long)]
    pub debug: bool,

    /// Results directory (default: ~/.onslaught/results/<target name>). Wiped on every run.
    #[arg(long, value_name = "DIR")]
    pub results: Option<PathBuf>,

    /// Runner configuration file (tool locations, timeout)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the run report as JSON after the summary
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// Console log level chosen by `--quiet` / `--debug`
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}
