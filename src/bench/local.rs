//! Mounted-mode runner
//!
//! Copies each source file into the mounted destination directory and reads
//! it back with ordinary file operations, 4 MiB at a time.

use async_trait::async_trait;

use crate::bench::trial::run_blocking_trial;
use crate::bench::{settle, BenchmarkRunner, TrialContext, TrialOutcome};
use crate::config::{Backend, BenchmarkConfig};
use crate::io::fileset::{check_destination, SourceFile};
use crate::io::local::{copy_chunked, delete_if_exists, drain_chunked, AbortFlag};
use crate::models::record::OpKind;
use crate::{BenchError, Result, CHUNK_SIZE};

pub struct LocalCopyRunner {
    config: BenchmarkConfig,
}

impl LocalCopyRunner {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BenchmarkRunner for LocalCopyRunner {
    fn backend(&self) -> Backend {
        Backend::Mounted
    }

    fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    async fn run_file(&self, file: &SourceFile, ctx: &mut TrialContext<'_>) -> Result<bool> {
        let runner = self.backend().name();
        let dest_dir = self
            .config
            .dest_dir
            .as_deref()
            .ok_or_else(|| BenchError::ConfigError("mounted mode requires --destdir".to_string()))?;
        let dest = dest_dir.join(&file.name);
        let limit = self.config.timeout;
        let mut completed = true;

        for iteration in 0..self.config.loop_count {
            delete_if_exists(&dest);

            let (src, dst) = (file.path.clone(), dest.clone());
            let copy = move |abort: &AbortFlag| copy_chunked(&src, &dst, CHUNK_SIZE, abort);
            let result = run_blocking_trial(ctx.cancel, limit, copy).await;
            if let TrialOutcome::Failed =
                settle(ctx, runner, &file.name, OpKind::Write, iteration, result)?
            {
                completed = false;
            }
        }

        // reads must measure a complete copy, never one cut short
        match check_destination(&dest) {
            Ok(size) if Some(size) == file.size() => {}
            Ok(size) => {
                tracing::warn!(
                    runner,
                    file = %file.name,
                    dest = %dest.display(),
                    size,
                    expected = ?file.size(),
                    "skipping read trials, destination is incomplete"
                );
                return Ok(false);
            }
            Err(e) => {
                tracing::warn!(
                    runner,
                    file = %file.name,
                    dest = %dest.display(),
                    "skipping read trials, destination not readable: {}",
                    e
                );
                return Ok(false);
            }
        }

        for iteration in 0..self.config.loop_count {
            let path = dest.clone();
            let drain = move |abort: &AbortFlag| drain_chunked(&path, CHUNK_SIZE, abort);
            let result = run_blocking_trial(ctx.cancel, limit, drain).await;
            if let TrialOutcome::Failed =
                settle(ctx, runner, &file.name, OpKind::Read, iteration, result)?
            {
                completed = false;
            }
        }

        Ok(completed)
    }
}
