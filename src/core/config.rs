//! Runner configuration from YAML
//!
//! The config only says where the external tools live and how long they may
//! run. It has no way to switch off or tune a check.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Packages installed into the virtualenv before the project itself
pub const TEST_DEPENDENCIES: [&str; 2] = [
    "twisted >= 14.0", // For trial
    "coverage == 4.0.3",
];

/// Top-level runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// Locations of the external tools
    #[serde(default)]
    pub tools: ToolPaths,

    /// Timeout for each tool invocation in seconds (0 disables)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// External tools taken from the caller's environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolPaths {
    /// Interpreter used to read the project metadata
    #[serde(default = "default_python")]
    pub python: String,

    #[serde(default = "default_virtualenv")]
    pub virtualenv: String,

    #[serde(default = "default_flake8")]
    pub flake8: String,
}

fn default_timeout_secs() -> u64 {
    1800
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_virtualenv() -> String {
    "virtualenv".to_string()
}

fn default_flake8() -> String {
    "flake8".to_string()
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            python: default_python(),
            virtualenv: default_virtualenv(),
            flake8: default_flake8(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            tools: ToolPaths::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GateConfig {
    /// Per-user config file, `~/.onslaught/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".onslaught").join("config.yaml"))
    }

    /// Load the config named on the command line, else the per-user file if it
    /// exists, else the built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GateConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("python", &self.tools.python),
            ("virtualenv", &self.tools.virtualenv),
            ("flake8", &self.tools.flake8),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("Tool '{}' has an empty path", name);
            }
        }
        Ok(())
    }
}
