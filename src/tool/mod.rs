//! External tool invocation

pub mod output;
pub mod subprocess;

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};

pub use output::{ToolError, ToolOutput};
pub use subprocess::SubprocessRunner;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// Working directory for the child process
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl AsRef<std::ffi::OsStr>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.as_ref().to_string_lossy().into_owned(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Value following `flag` in the argument list, if any
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Trait for running external tools - allows the gate to be driven by a fake in tests
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the invocation to completion, writing its combined stdout and
    /// stderr to `log_path`.
    ///
    /// A non-zero exit is not an error: it is reported through
    /// [`ToolOutput::exit_code`]. Errors mean the tool could not be run at all.
    async fn run(&self, invocation: &Invocation, log_path: &Path) -> Result<ToolOutput, ToolError>;
}
