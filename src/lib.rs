//! onslaught - run a Python project through a fixed battery of quality checks

pub mod cli;
pub mod core;
pub mod execution;
pub mod tool;

// Re-export commonly used types
pub use core::config::GateConfig;
pub use core::{Project, RunReport, StepFailure, StepKind, StepOutcome, StepResult};
pub use execution::{GateEngine, GateEvent, Session, SessionError};
pub use tool::{Invocation, SubprocessRunner, ToolError, ToolOutput, ToolRunner};
