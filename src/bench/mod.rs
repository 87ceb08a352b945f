//! Benchmark engine module
//!
//! A runner owns one backend. The shared driving loop lives in the default
//! [`BenchmarkRunner::run`]: header, every file in list order (all write
//! trials, then all read trials), footer.

use async_trait::async_trait;

use crate::config::{Backend, BenchmarkConfig};
use crate::io::fileset::{FileSet, SourceFile};
use crate::models::record::{BenchmarkRecord, OpKind, RECORD_COLUMNS};
use crate::models::summary::RunnerTally;
use crate::report::StatWriter;
use crate::{BenchError, Result};

pub mod cancel;
pub mod local;
pub mod remote;
pub mod trial;

pub use cancel::{cancel_pair, CancelSource, CancelToken};
pub use local::LocalCopyRunner;
pub use remote::RemoteObjectRunner;
pub use trial::{run_trial, TrialSample};

/// Everything a runner writes to while it runs
pub struct TrialContext<'a> {
    pub out: &'a mut StatWriter,
    pub tally: &'a mut RunnerTally,
    pub cancel: &'a CancelToken,
}

impl<'a> TrialContext<'a> {
    pub fn new(
        out: &'a mut StatWriter,
        tally: &'a mut RunnerTally,
        cancel: &'a CancelToken,
    ) -> Self {
        Self { out, tally, cancel }
    }

    /// Emit a completed trial and fold it into the tally
    pub fn record(&mut self, file: &str, op: OpKind, sample: TrialSample) -> Result<()> {
        let record = BenchmarkRecord::new(file, op, sample.bytes, sample.elapsed);
        self.out.print_record(&record)?;
        self.tally.add(&record);
        Ok(())
    }
}

/// What happened to one trial after it ran
pub(crate) enum TrialOutcome {
    Recorded,
    Failed,
}

/// Record a trial result, or log it and carry on
///
/// Cancellation and sink failures propagate; anything else only fails the trial.
pub(crate) fn settle(
    ctx: &mut TrialContext<'_>,
    runner: &str,
    file: &str,
    op: OpKind,
    iteration: u32,
    result: Result<TrialSample>,
) -> Result<TrialOutcome> {
    match result {
        Ok(sample) => {
            ctx.record(file, op, sample)?;
            Ok(TrialOutcome::Recorded)
        }
        Err(BenchError::Cancelled) => Err(BenchError::Cancelled),
        Err(e) => {
            tracing::warn!(
                runner,
                file,
                %op,
                iteration,
                category = ?e.category(),
                "trial failed: {}",
                e
            );
            Ok(TrialOutcome::Failed)
        }
    }
}

/// One backend under benchmark
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    fn backend(&self) -> Backend;

    fn config(&self) -> &BenchmarkConfig;

    /// Configuration sufficiency for this backend
    fn check_runnable(&self) -> Result<()> {
        self.config().validate_for(self.backend())
    }

    fn is_runnable(&self) -> bool {
        match self.check_runnable() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(runner = self.backend().name(), "not runnable: {}", e);
                false
            }
        }
    }

    /// Exactly `loop_count` write trials then `loop_count` read trials for
    /// one file. `Ok(false)` means at least one trial did not complete.
    async fn run_file(&self, file: &SourceFile, ctx: &mut TrialContext<'_>) -> Result<bool>;

    /// Benchmark every configured file in list order.
    ///
    /// Files missing from the source directory are skipped without failing
    /// the run; any other per-file problem makes the result `false`.
    async fn run(&self, ctx: &mut TrialContext<'_>) -> Result<bool> {
        let runner = self.backend().name();
        let config = self.config();
        let files = FileSet::resolve(&config.src_dir, config.files.as_slice())?;

        tracing::info!(
            runner,
            files = files.len(),
            ready = files.ready_count(),
            loops = config.loop_count,
            "starting run"
        );

        ctx.out.print_header(&RECORD_COLUMNS)?;

        let mut all_completed = true;
        for file in files.iter() {
            if let Some(e) = file.to_error() {
                tracing::warn!(runner, file = %file.name, "skipping file: {}", e);
                continue;
            }

            match self.run_file(file, ctx).await {
                Ok(true) => tracing::debug!(runner, file = %file.name, "file completed"),
                Ok(false) => {
                    tracing::warn!(runner, file = %file.name, "file did not complete every trial");
                    all_completed = false;
                }
                Err(BenchError::Cancelled) => return Err(BenchError::Cancelled),
                Err(e) => {
                    tracing::warn!(runner, file = %file.name, "file failed: {}", e);
                    all_completed = false;
                }
            }
        }

        ctx.out.print_footer::<&str>(&[])?;
        Ok(all_completed)
    }
}
