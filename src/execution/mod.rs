//! Gate execution

pub mod coverage;
pub mod engine;
pub mod executor;
pub mod session;

pub use engine::{EventHandler, GateEngine, GateEvent};
pub use executor::StepExecutor;
pub use session::{Session, SessionError};
