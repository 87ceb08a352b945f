//! Data models module
//!
//! Per-trial records as emitted on the statistics stream and the
//! aggregated summaries built from them.

pub mod record;
pub mod summary;

pub use record::{BenchmarkRecord, OpKind, RECORD_COLUMNS};
pub use summary::{FileOpSummary, LatencyStats, RunSummary, RunnerSummary, RunnerTally};
