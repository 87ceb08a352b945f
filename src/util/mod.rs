//! Utility functions module
//!
//! Helpers for human-readable units in summaries and logs.

pub mod units;

pub use units::{calculate_throughput_mbps, format_bytes, format_latency, format_throughput};
