//! Aggregated run statistics
//!
//! Every emitted record is folded into a per-(file, op) tally so a run can
//! be summarised at the end without re-reading the statistics stream.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::record::{BenchmarkRecord, OpKind};
use crate::util::units::calculate_throughput_mbps;
use crate::Result;

/// Latency statistics with min/avg/max and percentiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    #[serde(with = "duration_serde")]
    pub min: Duration,
    #[serde(with = "duration_serde")]
    pub avg: Duration,
    #[serde(with = "duration_serde")]
    pub max: Duration,
    /// Latency percentiles (50th, 95th, 99th)
    #[serde(with = "percentiles_serde")]
    pub percentiles: HashMap<u8, Duration>,
}

impl LatencyStats {
    /// Create latency statistics from a list of samples
    pub fn from_samples(samples: &[Duration]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort();
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        let avg_nanos: u128 =
            sorted.iter().map(|d| d.as_nanos()).sum::<u128>() / sorted.len() as u128;
        let avg = Duration::from_nanos(avg_nanos as u64);

        let percentiles = [50u8, 95, 99]
            .into_iter()
            .map(|p| (p, sorted[sorted.len() * p as usize / 100]))
            .collect();

        Self {
            min,
            avg,
            max,
            percentiles,
        }
    }

    pub fn p50(&self) -> Duration {
        self.percentiles.get(&50).copied().unwrap_or(self.avg)
    }

    pub fn p95(&self) -> Duration {
        self.percentiles.get(&95).copied().unwrap_or(self.max)
    }
}

/// Statistics for one file and operation within one runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileOpSummary {
    pub file: String,
    pub op: OpKind,
    pub trials: usize,
    pub bytes: u64,
    #[serde(with = "duration_serde")]
    pub total_time: Duration,
    pub throughput_mbps: f64,
    pub latency: LatencyStats,
}

/// Everything one runner produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerSummary {
    pub runner: String,
    pub completed: bool,
    pub entries: Vec<FileOpSummary>,
}

impl RunnerSummary {
    pub fn total_trials(&self) -> usize {
        self.entries.iter().map(|e| e.trials).sum()
    }
}

/// Whole-invocation summary, exportable as JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub loop_count: u32,
    pub runners: Vec<RunnerSummary>,
}

impl RunSummary {
    pub fn new(loop_count: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            loop_count,
            runners: Vec::new(),
        }
    }

    pub fn push(&mut self, runner: RunnerSummary) {
        self.runners.push(runner);
    }

    /// Write the summary as pretty JSON, replacing any existing file
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[derive(Debug)]
struct Tally {
    file: String,
    op: OpKind,
    bytes: u64,
    samples: Vec<Duration>,
}

/// Accumulates records for one runner, in first-seen order
#[derive(Debug, Default)]
pub struct RunnerTally {
    tallies: Vec<Tally>,
}

impl RunnerTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &BenchmarkRecord) {
        let position = self
            .tallies
            .iter()
            .position(|t| t.file == record.file && t.op == record.op);
        let tally = match position {
            Some(i) => &mut self.tallies[i],
            None => {
                self.tallies.push(Tally {
                    file: record.file.clone(),
                    op: record.op,
                    bytes: 0,
                    samples: Vec::new(),
                });
                let last = self.tallies.len() - 1;
                &mut self.tallies[last]
            }
        };
        tally.bytes += record.size;
        tally.samples.push(record.elapsed);
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    pub fn finish(self, runner: &str, completed: bool) -> RunnerSummary {
        let entries = self
            .tallies
            .into_iter()
            .map(|t| {
                let total_time: Duration = t.samples.iter().sum();
                FileOpSummary {
                    throughput_mbps: calculate_throughput_mbps(t.bytes, total_time),
                    latency: LatencyStats::from_samples(&t.samples),
                    trials: t.samples.len(),
                    file: t.file,
                    op: t.op,
                    bytes: t.bytes,
                    total_time,
                }
            })
            .collect();

        RunnerSummary {
            runner: runner.to_string(),
            completed,
            entries,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_nanos().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u128::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos as u64))
    }
}

mod percentiles_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;
    use std::time::Duration;

    pub fn serialize<S>(
        percentiles: &HashMap<u8, Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let nanos_map: HashMap<u8, u128> = percentiles
            .iter()
            .map(|(&k, &v)| (k, v.as_nanos()))
            .collect();
        nanos_map.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<HashMap<u8, Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos_map = HashMap::<u8, u128>::deserialize(deserializer)?;
        Ok(nanos_map
            .into_iter()
            .map(|(k, v)| (k, Duration::from_nanos(v as u64)))
            .collect())
    }
}
