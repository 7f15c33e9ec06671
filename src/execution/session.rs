//! Per-run results directory and tool invocation bookkeeping

use crate::core::Project;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Version-control directories left out of the private source copy
const SKIPPED_DIRS: [&str; 3] = [".git", ".hg", ".svn"];

/// Errors preparing the results directory
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("results directory {results} overlaps the target {target}")]
    Overlap { results: PathBuf, target: PathBuf },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_err(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> SessionError {
    let path = path.to_path_buf();
    move |source| SessionError::Io {
        action,
        path,
        source,
    }
}

/// Owns the results directory of one run
///
/// Every tool invocation gets a numbered log file under `logs/` from
/// [`Session::next_log_path`].
#[derive(Debug)]
pub struct Session {
    project: Project,
    results: PathBuf,
    logstep: AtomicUsize,
}

impl Session {
    /// `~/.onslaught/results/<project dir name>`
    pub fn default_results_dir(project: &Project) -> Option<PathBuf> {
        dirs::home_dir().map(|home| {
            home.join(".onslaught")
                .join("results")
                .join(project.dir_name())
        })
    }

    /// Wipe and recreate the results directory
    pub fn create(project: Project, results: &Path) -> Result<Self, SessionError> {
        let results = resolve(results).map_err(io_err("resolve", results))?;
        let target = project.path();
        if results.starts_with(target) || target.starts_with(&results) {
            return Err(SessionError::Overlap {
                results,
                target: target.to_path_buf(),
            });
        }

        debug!("Preparing results directory: {}", results.display());
        match std::fs::remove_dir_all(&results) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_err("remove", &results)(e)),
        }

        let session = Self {
            project,
            results,
            logstep: AtomicUsize::new(0),
        };
        for dir in [session.logs_dir(), session.workdir()] {
            std::fs::create_dir_all(&dir).map_err(io_err("create", &dir))?;
        }
        Ok(session)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn results_dir(&self) -> &Path {
        &self.results
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.results.join("logs")
    }

    pub fn main_log(&self) -> PathBuf {
        self.logs_dir().join("main.log")
    }

    /// Scratch working directory, keeps the caller's cwd and the target clean
    pub fn workdir(&self) -> PathBuf {
        self.results.join("workdir")
    }

    pub fn venv(&self) -> PathBuf {
        self.results.join("venv")
    }

    /// Path of an executable inside the virtualenv
    pub fn venv_bin(&self, name: &str) -> PathBuf {
        self.venv().join("bin").join(name)
    }

    pub fn source_copy(&self) -> PathBuf {
        self.results.join("targetsrc")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.results.join("dist")
    }

    pub fn coverage_raw_dir(&self) -> PathBuf {
        self.results.join("coverage.orig")
    }

    pub fn coverage_dir(&self) -> PathBuf {
        self.results.join("coverage")
    }

    pub fn report_path(&self) -> PathBuf {
        self.results.join("report.json")
    }

    /// Reserve the next `NN.<label>.log` path
    pub fn next_log_path(&self, label: &str) -> PathBuf {
        let step = self.logstep.fetch_add(1, Ordering::SeqCst);
        self.logs_dir().join(format!("{:02}.{}.log", step, label))
    }

    /// Copy the project into `targetsrc/` so builds never write into it
    pub fn copy_source(&self) -> Result<PathBuf, SessionError> {
        let src = self.project.path();
        let dst = self.source_copy();
        debug!("Copying {} -> {}", src.display(), dst.display());

        let walker = WalkDir::new(src).into_iter().filter_entry(|e| {
            !(e.file_type().is_dir()
                && SKIPPED_DIRS.iter().any(|skip| e.file_name() == *skip))
        });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
                SessionError::Io {
                    action: "walk",
                    path,
                    source: e.into(),
                }
            })?;
            let Ok(rel) = entry.path().strip_prefix(src) else {
                continue;
            };
            let target = dst.join(rel);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                std::fs::create_dir_all(&target).map_err(io_err("create", &target))?;
            } else if file_type.is_symlink() {
                copy_symlink(entry.path(), &target)?;
            } else {
                std::fs::copy(entry.path(), &target).map_err(io_err("copy", entry.path()))?;
            }
        }
        Ok(dst)
    }

    /// Destroy the isolated environment
    pub fn teardown(&self) {
        let venv = self.venv();
        if !venv.exists() {
            return;
        }
        info!("Removing virtualenv {}", venv.display());
        if let Err(e) = std::fs::remove_dir_all(&venv) {
            warn!("Could not remove virtualenv {}: {}", venv.display(), e);
        }
    }
}

/// Absolute form of a path that may not exist yet, with symlinks in its
/// existing parent resolved so it compares against a canonical target
fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let abs = std::path::absolute(path)?;
    if let Ok(canonical) = abs.canonicalize() {
        return Ok(canonical);
    }
    let parent = abs.parent().and_then(|p| p.canonicalize().ok());
    match (parent, abs.file_name()) {
        (Some(parent), Some(name)) => Ok(parent.join(name)),
        _ => Ok(abs),
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), SessionError> {
    let link = std::fs::read_link(src).map_err(io_err("read link", src))?;
    std::os::unix::fs::symlink(&link, dst).map_err(io_err("link", dst))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dst: &Path) -> Result<(), SessionError> {
    warn!("Skipping symlink {}", src.display());
    Ok(())
}
