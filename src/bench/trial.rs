//! Timed execution of a single trial
//!
//! A trial races against the run's cancellation token and, when one is
//! configured, a per-trial timeout. The clock covers only the I/O.

use std::future::Future;
use std::io;
use std::time::{Duration, Instant};

use tokio::task;

use crate::bench::cancel::CancelToken;
use crate::io::local::AbortFlag;
use crate::{BenchError, Result};

/// Bytes moved by one trial and how long it took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSample {
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Why a trial stopped before its I/O finished
#[derive(Debug, Clone, Copy)]
enum Interruption {
    Timeout(Duration),
    Cancelled,
}

impl From<Interruption> for BenchError {
    fn from(interruption: Interruption) -> Self {
        match interruption {
            Interruption::Timeout(limit) => BenchError::Timeout(limit),
            Interruption::Cancelled => BenchError::Cancelled,
        }
    }
}

async fn race<F: Future>(
    cancel: &CancelToken,
    limit: Option<Duration>,
    op: F,
) -> std::result::Result<F::Output, Interruption> {
    match limit {
        Some(limit) => tokio::select! {
            res = tokio::time::timeout(limit, op) => res.map_err(|_| Interruption::Timeout(limit)),
            _ = cancel.cancelled() => Err(Interruption::Cancelled),
        },
        None => tokio::select! {
            res = op => Ok(res),
            _ = cancel.cancelled() => Err(Interruption::Cancelled),
        },
    }
}

/// Time `op`, honouring cancellation and an optional timeout
pub async fn run_trial<F>(
    cancel: &CancelToken,
    limit: Option<Duration>,
    op: F,
) -> Result<TrialSample>
where
    F: Future<Output = Result<u64>>,
{
    if cancel.is_cancelled() {
        return Err(BenchError::Cancelled);
    }

    let start = Instant::now();
    let outcome = race(cancel, limit, op).await;
    let elapsed = start.elapsed();

    let bytes = outcome??;
    Ok(TrialSample { bytes, elapsed })
}

/// Time blocking file I/O run on the blocking pool.
///
/// On timeout or cancellation `op`'s [`AbortFlag`] is raised and the
/// blocking task is awaited, so nothing keeps touching the file once this
/// returns.
pub async fn run_blocking_trial<F>(
    cancel: &CancelToken,
    limit: Option<Duration>,
    op: F,
) -> Result<TrialSample>
where
    F: FnOnce(&AbortFlag) -> io::Result<u64> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(BenchError::Cancelled);
    }

    let abort = AbortFlag::new();
    let flag = abort.clone();
    let start = Instant::now();
    let mut handle = task::spawn_blocking(move || op(&flag));
    let outcome = race(cancel, limit, &mut handle).await;
    let elapsed = start.elapsed();

    match outcome {
        Ok(joined) => {
            let bytes = joined.map_err(join_error)??;
            Ok(TrialSample { bytes, elapsed })
        }
        Err(interruption) => {
            abort.raise();
            if let Err(e) = handle.await {
                tracing::warn!("{}", join_error(e));
            }
            Err(interruption.into())
        }
    }
}

fn join_error(e: task::JoinError) -> BenchError {
    BenchError::BenchmarkError(format!("blocking I/O task failed: {}", e))
}
