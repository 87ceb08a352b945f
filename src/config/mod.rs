//! Configuration management module
//!
//! Holds the immutable benchmark configuration built once at startup and
//! the runnability rules each backend checks before any I/O happens.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::io::fileset::FileSet;
use crate::{BenchError, Result, DEFAULT_LOOP_COUNT};

pub mod file;

pub use file::ConfigFile;

/// Which backends a run benchmarks
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Ordinary file operations against the mounted filesystem
    #[value(alias = "mgridfs")]
    Mounted,
    /// GridFS put/get through the driver
    #[value(alias = "gridfs")]
    Direct,
    /// Mounted first, then direct
    Both,
}

/// A single backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mounted,
    Direct,
}

impl RunMode {
    /// Backends selected by this mode, in execution order
    pub fn backends(self) -> &'static [Backend] {
        match self {
            RunMode::Mounted => &[Backend::Mounted],
            RunMode::Direct => &[Backend::Direct],
            RunMode::Both => &[Backend::Mounted, Backend::Direct],
        }
    }
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Backend::Mounted => "mounted",
            Backend::Direct => "direct",
        }
    }
}

/// Remote store parameters as supplied; any of them may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteParams {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub db: Option<String>,
    pub coll_prefix: Option<String>,
}

/// Fully specified connection parameters for direct mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub server: String,
    pub port: u16,
    pub db: String,
    pub coll_prefix: String,
}

impl ConnectionParams {
    pub fn uri(&self) -> String {
        format!("mongodb://{}:{}", self.server, self.port)
    }
}

impl RemoteParams {
    /// Require all four parameters, naming every missing one
    pub fn resolve(&self) -> Result<ConnectionParams> {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let server = non_blank(&self.server);
        let db = non_blank(&self.db);
        let coll_prefix = non_blank(&self.coll_prefix);

        let mut missing = Vec::new();
        if server.is_none() {
            missing.push("--server");
        }
        if self.port.is_none() {
            missing.push("--port");
        }
        if db.is_none() {
            missing.push("--db");
        }
        if coll_prefix.is_none() {
            missing.push("--collprefix");
        }

        match (server, self.port, db, coll_prefix) {
            (Some(server), Some(port), Some(db), Some(coll_prefix)) => Ok(ConnectionParams {
                server,
                port,
                db,
                coll_prefix,
            }),
            _ => Err(BenchError::ConfigError(format!(
                "direct mode requires {}",
                missing.join(", ")
            ))),
        }
    }
}

/// Benchmark configuration, read-only once constructed
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Backends to benchmark
    pub mode: RunMode,
    /// Directory the source files are read from during write trials
    pub src_dir: PathBuf,
    /// Mounted destination directory (mounted mode)
    pub dest_dir: Option<PathBuf>,
    /// Remote store parameters (direct mode)
    pub remote: RemoteParams,
    /// File names relative to `src_dir`, in command-line order
    pub files: Vec<String>,
    /// Write and read repetitions per file
    pub loop_count: u32,
    /// Statistics sink; `None` means standard output
    pub outfile: Option<PathBuf>,
    pub verbose: bool,
    /// Per-trial timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Optional JSON summary export
    pub summary_path: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Mounted,
            src_dir: PathBuf::from("."),
            dest_dir: None,
            remote: RemoteParams::default(),
            files: Vec::new(),
            loop_count: DEFAULT_LOOP_COUNT,
            outfile: None,
            verbose: false,
            timeout: None,
            summary_path: None,
        }
    }
}

impl BenchmarkConfig {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Check everything `backend` needs before it may touch any file
    pub fn validate_for(&self, backend: Backend) -> Result<()> {
        if self.files.is_empty() {
            return Err(BenchError::ConfigError("file list is empty".to_string()));
        }

        if self.loop_count == 0 {
            return Err(BenchError::ConfigError(
                "loop count must be greater than 0".to_string(),
            ));
        }

        FileSet::check_source_dir(&self.src_dir)?;

        match backend {
            Backend::Mounted => {
                let dest = self.dest_dir.as_deref().ok_or_else(|| {
                    BenchError::ConfigError("mounted mode requires --destdir".to_string())
                })?;
                check_dir(dest, "destination")?;
            }
            Backend::Direct => {
                self.remote.resolve()?;
            }
        }

        Ok(())
    }

    /// Validate every backend the mode selects
    pub fn validate(&self) -> Result<()> {
        self.mode
            .backends()
            .iter()
            .try_for_each(|backend| self.validate_for(*backend))
    }

    pub fn with_src_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.src_dir = dir.into();
        self
    }

    pub fn with_dest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dest_dir = Some(dir.into());
        self
    }

    pub fn with_remote(mut self, remote: RemoteParams) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_loop_count(mut self, count: u32) -> Self {
        self.loop_count = count;
        self
    }

    pub fn with_outfile(mut self, path: impl Into<PathBuf>) -> Self {
        self.outfile = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }
}

fn check_dir(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        return Err(BenchError::ConfigError(format!(
            "{} directory does not exist: {}",
            what,
            path.display()
        )));
    }
    if !path.is_dir() {
        return Err(BenchError::ConfigError(format!(
            "{} path is not a directory: {}",
            what,
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn full_remote() -> RemoteParams {
        RemoteParams {
            server: Some("localhost".into()),
            port: Some(27017),
            db: Some("bench".into()),
            coll_prefix: Some("fs".into()),
        }
    }

    #[test]
    fn test_mode_backends() {
        assert_eq!(RunMode::Mounted.backends(), &[Backend::Mounted]);
        assert_eq!(RunMode::Direct.backends(), &[Backend::Direct]);
        assert_eq!(RunMode::Both.backends(), &[Backend::Mounted, Backend::Direct]);
    }

    #[test]
    fn test_remote_resolve_names_missing_params() {
        let params = RemoteParams {
            server: Some("db.local".into()),
            port: None,
            db: Some("  ".into()),
            coll_prefix: Some("fs".into()),
        };
        let err = params.resolve().unwrap_err().to_string();
        assert!(err.contains("--port"));
        assert!(err.contains("--db"));
        assert!(!err.contains("--server"));

        let resolved = full_remote().resolve().unwrap();
        assert_eq!(resolved.uri(), "mongodb://localhost:27017");
        assert_eq!(resolved.coll_prefix, "fs");
    }

    #[test]
    fn test_mounted_requires_destdir() {
        let src = TempDir::new().unwrap();
        let config = BenchmarkConfig::new(RunMode::Mounted)
            .with_src_dir(src.path())
            .with_files(["a.txt"]);
        assert!(config.validate_for(Backend::Mounted).is_err());

        let dest = TempDir::new().unwrap();
        let config = config.with_dest_dir(dest.path());
        assert!(config.validate_for(Backend::Mounted).is_ok());
    }

    #[test]
    fn test_rejects_empty_file_list_and_zero_loops() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let config = BenchmarkConfig::new(RunMode::Mounted)
            .with_src_dir(src.path())
            .with_dest_dir(dest.path());
        assert!(config.validate().is_err());

        let config = config.with_files(["a"]).with_loop_count(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_source_dir_is_fatal() {
        let dest = TempDir::new().unwrap();
        let config = BenchmarkConfig::new(RunMode::Mounted)
            .with_src_dir("/definitely/not/here")
            .with_dest_dir(dest.path())
            .with_files(["a"]);
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Configuration);
    }

    #[test]
    fn test_both_mode_checks_each_backend() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let config = BenchmarkConfig::new(RunMode::Both)
            .with_src_dir(src.path())
            .with_dest_dir(dest.path())
            .with_files(["a"]);
        assert!(config.validate().is_err());
        assert!(config.with_remote(full_remote()).validate().is_ok());
    }
}
