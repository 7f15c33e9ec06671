//! Core domain models
//!
//! The project under test, the fixed steps, their outcomes, and the
//! aggregate run report.

pub mod config;
pub mod context;
pub mod project;
pub mod report;
pub mod state;
pub mod step;
pub mod warnings;

pub use context::*;
pub use project::*;
pub use report::*;
pub use state::*;
pub use step::*;
