//! Direct-mode runner
//!
//! Puts each source file into the object store under its own name and reads
//! the latest version back. Every write trial starts from zero stored
//! versions so it measures a fresh insert, never an update.

use async_trait::async_trait;
use tokio::fs::File;

use crate::bench::trial::run_trial;
use crate::bench::{settle, BenchmarkRunner, TrialContext, TrialOutcome};
use crate::config::{Backend, BenchmarkConfig};
use crate::io::fileset::SourceFile;
use crate::io::store::ObjectStore;
use crate::models::record::OpKind;
use crate::Result;

pub struct RemoteObjectRunner<S> {
    config: BenchmarkConfig,
    store: S,
}

impl<S: ObjectStore> RemoteObjectRunner<S> {
    pub fn new(config: BenchmarkConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: ObjectStore> BenchmarkRunner for RemoteObjectRunner<S> {
    fn backend(&self) -> Backend {
        Backend::Direct
    }

    fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    async fn run_file(&self, file: &SourceFile, ctx: &mut TrialContext<'_>) -> Result<bool> {
        let runner = self.backend().name();
        let name = file.name.as_str();
        let limit = self.config.timeout;
        let mut completed = true;

        for iteration in 0..self.config.loop_count {
            // untimed; a failed cleanup would let versions pile up, so it fails the trial
            match self.store.delete_versions(name).await {
                Ok(deleted) => {
                    tracing::debug!(
                        runner,
                        file = name,
                        iteration,
                        deleted,
                        "removed stored versions"
                    );
                }
                Err(e) => {
                    tracing::warn!(runner, file = name, iteration, "version cleanup failed: {}", e);
                    completed = false;
                    continue;
                }
            }

            let upload = async {
                let mut source = File::open(&file.path).await?;
                self.store.upload(name, &mut source).await
            };
            let result = run_trial(ctx.cancel, limit, upload).await;
            if let TrialOutcome::Failed =
                settle(ctx, runner, name, OpKind::Write, iteration, result)?
            {
                completed = false;
            }
        }

        for iteration in 0..self.config.loop_count {
            let download = async { self.store.download(name).await?.verify(name) };
            let result = run_trial(ctx.cancel, limit, download).await;
            if let TrialOutcome::Failed =
                settle(ctx, runner, name, OpKind::Read, iteration, result)?
            {
                completed = false;
            }
        }

        Ok(completed)
    }
}
