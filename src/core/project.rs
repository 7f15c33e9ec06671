//! The project under test

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A Python project directory, treated as read-only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    path: PathBuf,
}

impl Project {
    /// Resolve `target` to an absolute project directory
    pub fn open<P: AsRef<Path>>(target: P) -> Result<Self> {
        let target = target.as_ref();
        let path = target
            .canonicalize()
            .with_context(|| format!("Target {} does not exist", target.display()))?;
        if !path.is_dir() {
            anyhow::bail!("Target {} is not a directory", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used to name the default results directory
    pub fn dir_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }

    /// Record every path currently under the project
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            root: self.path.clone(),
            manifest: walk(&self.path).collect(),
        }
    }
}

fn walk(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
}

/// Paths present under a project at one moment
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    root: PathBuf,
    manifest: HashSet<PathBuf>,
}

impl ProjectSnapshot {
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    /// Remove anything created under the project since the snapshot was taken
    ///
    /// Returns the top-most removed paths. Failures to remove are logged and
    /// skipped.
    pub fn restore(&self) -> Vec<PathBuf> {
        debug!("Cleaning up anything created in {} during the run", self.root.display());

        let current: Vec<PathBuf> = walk(&self.root).collect();
        let mut removed = Vec::new();
        for path in current {
            if self.manifest.contains(&path) {
                continue;
            }
            // A parent created during the run may already be gone.
            let Ok(meta) = path.symlink_metadata() else {
                continue;
            };
            let result = if meta.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match result {
                Ok(()) => {
                    info!("Removed {} left behind in the project", path.display());
                    removed.push(path);
                }
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}
