//! Per-trial benchmark records

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Header columns of the statistics stream
pub const RECORD_COLUMNS: [&str; 5] = ["file", "op", "size", "repeat_count", "time (millisecs)"];

/// Kind of timed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Write,
    Read,
}

impl OpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Write => "write",
            OpKind::Read => "read",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed read or write trial
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    pub file: String,
    pub op: OpKind,
    /// Bytes actually transferred in this trial
    pub size: u64,
    /// Always 1: every trial is emitted on its own
    pub repeat_count: u32,
    pub elapsed: Duration,
}

impl BenchmarkRecord {
    pub fn new(file: impl Into<String>, op: OpKind, size: u64, elapsed: Duration) -> Self {
        Self {
            file: file.into(),
            op,
            size,
            repeat_count: 1,
            elapsed,
        }
    }

    /// Elapsed wall-clock time in fractional milliseconds
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Column values in `RECORD_COLUMNS` order
    pub fn fields(&self) -> [String; 5] {
        [
            self.file.clone(),
            self.op.to_string(),
            self.size.to_string(),
            self.repeat_count.to_string(),
            format!("{:.3}", self.elapsed_millis()),
        ]
    }
}
