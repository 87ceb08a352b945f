//! gridbench - GridFS file I/O benchmark
//!
//! Times repeated file writes and reads against a GridFS-backed filesystem
//! mount ("mounted" mode) and against GridFS itself through the MongoDB
//! driver ("direct" mode), emitting one tab-separated record per trial.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub mod bench;
pub mod cli;
pub mod config;
pub mod driver;
pub mod io;
pub mod models;
pub mod report;
pub mod util;

/// Common error type for every benchmark operation
#[derive(Debug, Error)]
pub enum BenchError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    /// Configuration validation or parsing error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// A listed source file is missing or cannot be opened
    #[error("Source file not accessible: {}: {reason}", path.display())]
    MissingSource { path: PathBuf, reason: String },
    /// The remote store has no stored version for a key
    #[error("No stored object named {0}")]
    ObjectNotFound(String),
    /// Remote driver error
    #[error("Object store error: {0}")]
    StoreError(#[from] mongodb::error::Error),
    /// Bytes read back disagree with the stored object's declared length
    #[error("Integrity error: read {actual} bytes of {name}, declared length is {expected}")]
    IntegrityError {
        name: String,
        expected: u64,
        actual: u64,
    },
    /// A single trial exceeded the configured timeout
    #[error("Trial timed out after {}", humantime::format_duration(*.0))]
    Timeout(Duration),
    /// The run was interrupted
    #[error("Benchmark cancelled")]
    Cancelled,
    /// Benchmark execution error
    #[error("Benchmark error: {0}")]
    BenchmarkError(String),
    /// Config file parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
    /// Summary serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// How a failure is handled by the runners and the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Fatal before any I/O happens
    Configuration,
    /// Skip the file, continue with the next one
    PerFile,
    /// Skip the trial's record, continue the loop
    PerTrial,
    /// Logged as a warning, the loop continues
    Integrity,
    /// Stop the current runner
    Interrupted,
}

impl BenchError {
    /// Classify this error for skip-vs-abort decisions
    pub fn category(&self) -> ErrorCategory {
        match self {
            BenchError::ConfigError(_) | BenchError::TomlError(_) => ErrorCategory::Configuration,
            BenchError::MissingSource { .. } => ErrorCategory::PerFile,
            BenchError::IntegrityError { .. } => ErrorCategory::Integrity,
            BenchError::Cancelled => ErrorCategory::Interrupted,
            BenchError::IoError(_)
            | BenchError::ObjectNotFound(_)
            | BenchError::StoreError(_)
            | BenchError::Timeout(_)
            | BenchError::BenchmarkError(_)
            | BenchError::JsonError(_) => ErrorCategory::PerTrial,
        }
    }
}

/// Result type alias for gridbench operations
pub type Result<T> = std::result::Result<T, BenchError>;

pub const APP_NAME: &str = "gridbench";
pub const CONFIG_FILE: &str = "gridbench.toml";
/// Chunk size for every streamed read and write, local or remote
pub const CHUNK_SIZE: usize = 4 * 1024 * 1024;
pub const DEFAULT_LOOP_COUNT: u32 = 100;
/// Exit status when nothing may run: bad configuration or a runner not runnable
pub const EXIT_NOT_RUNNABLE: i32 = -1;
