//! Optional TOML defaults file
//!
//! Values found here fill in whatever the command line leaves out.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{BenchError, Result, APP_NAME, CONFIG_FILE};

/// Defaults read from `gridbench.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub db: Option<String>,
    pub collprefix: Option<String>,
    pub loopcnt: Option<u32>,
    /// Per-trial timeout in humantime syntax, e.g. "30s"
    pub timeout: Option<String>,
    pub srcdir: Option<PathBuf>,
    pub destdir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load an explicitly named config file; it must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BenchError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::parse(&content).map_err(|e| {
            BenchError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load the standard config file, or defaults if there is none
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: Self = toml::from_str(content)?;
        file.timeout()?;
        Ok(file)
    }

    /// Standard config file location: `$CONFIG_HOME/gridbench/gridbench.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| {
                humantime::parse_duration(raw).map_err(|e| {
                    BenchError::ConfigError(format!("invalid timeout {:?}: {}", raw, e))
                })
            })
            .transpose()
    }
}
