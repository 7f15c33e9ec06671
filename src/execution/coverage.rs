//! Coverage report path tidying
//!
//! Coverage and trial print absolute paths into the virtualenv's
//! site-packages. These are rewritten to something a reader can map back to
//! the project.

use regex::{NoExpand, Regex};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Replacement for the virtualenv prefix in HTML reports
pub const HTML_ELLIPSIS: &str = "&#x2026;";

/// Replacement for the virtualenv prefix in plain text reports
pub const TEXT_ELLIPSIS: &str = "...";

/// Rewrites `/.../site-packages/<pkg>` to `<replacement>/<pkg>`
#[derive(Debug, Clone)]
pub struct VenvPathTidier {
    pattern: Regex,
    package: String,
}

impl VenvPathTidier {
    pub fn new(package: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"/[/A-Za-z0-9._-]+/site-packages/{}",
            regex::escape(package)
        ))?;
        Ok(Self {
            pattern,
            package: package.to_string(),
        })
    }

    pub fn tidy(&self, text: &str, replacement: &str) -> String {
        let replacement = format!("{}/{}", replacement, self.package);
        self.pattern
            .replace_all(text, NoExpand(&replacement))
            .into_owned()
    }

    /// Copy an HTML coverage report, tidying paths in every `.html` file
    pub fn tidy_html_report(&self, raw: &Path, nice: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(nice)?;

        for entry in WalkDir::new(raw).min_depth(1) {
            let entry = entry?;
            let Ok(rel) = entry.path().strip_prefix(raw) else {
                continue;
            };
            let dst = nice.join(rel);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dst)?;
            } else if entry.path().extension().is_some_and(|ext| ext == "html") {
                debug!("Tidying paths from {} -> {}", entry.path().display(), dst.display());
                let src = std::fs::read_to_string(entry.path())?;
                std::fs::write(&dst, self.tidy(&src, HTML_ELLIPSIS))?;
            } else {
                std::fs::copy(entry.path(), &dst)?;
            }
        }
        Ok(())
    }
}
