//! Warning detection in build logs

use regex::Regex;
use std::sync::LazyLock;

/// `warning: ...`, `WARNING ...` at the start of a line
static LEADING_WARNING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*warning\b").expect("static regex"));

/// Python warning categories: `UserWarning:`, `DeprecationWarning:`, ...
static WARNING_CATEGORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]*Warning:").expect("static regex"));

/// Check whether a single log line carries a warning marker
pub fn is_warning_line(line: &str) -> bool {
    LEADING_WARNING.is_match(line) || WARNING_CATEGORY.is_match(line)
}

/// Collect every warning-marked line of a log, trimmed, in order
pub fn scan_warnings(log: &str) -> Vec<String> {
    log.lines()
        .filter(|line| is_warning_line(line))
        .map(|line| line.trim().to_string())
        .collect()
}
