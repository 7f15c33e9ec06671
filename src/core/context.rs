//! Run context - facts one step hands to the next

use std::path::PathBuf;

/// Data produced by earlier steps of a run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    /// Package name read from the project metadata
    pub package: Option<String>,

    /// Source distribution built by the packaging step
    pub sdist: Option<PathBuf>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the packaging step left an installed artifact to test
    pub fn has_installed_artifact(&self) -> bool {
        self.package.is_some() && self.sdist.is_some()
    }
}
