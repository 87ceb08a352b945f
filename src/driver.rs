//! Invocation driver
//!
//! Builds the runners the mode selects, gates on every one of them being
//! runnable, then executes them one after another against a single shared
//! statistics sink. The exit status is the number of runners that failed.

use crate::bench::{BenchmarkRunner, CancelToken, LocalCopyRunner, RemoteObjectRunner, TrialContext};
use crate::config::{Backend, BenchmarkConfig};
use crate::io::GridFsStore;
use crate::models::summary::{RunSummary, RunnerSummary, RunnerTally};
use crate::report::StatWriter;
use crate::util::units::{format_bytes, format_latency, format_throughput};
use crate::{Result, EXIT_NOT_RUNNABLE};

/// Lifecycle of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Configured,
    Running,
    Done,
}

impl Default for DriverState {
    fn default() -> Self {
        Self::Idle
    }
}

pub struct Driver {
    config: Option<BenchmarkConfig>,
    cancel: CancelToken,
    state: DriverState,
}

impl Driver {
    /// An idle driver waiting for its configuration
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            config: None,
            cancel,
            state: DriverState::Idle,
        }
    }

    /// Shorthand for [`Driver::new`] followed by [`Driver::configure`]
    pub fn with_config(config: BenchmarkConfig, cancel: CancelToken) -> Self {
        let mut driver = Self::new(cancel);
        driver.configure(config);
        driver
    }

    /// Accept the parsed configuration
    pub fn configure(&mut self, config: BenchmarkConfig) {
        self.config = Some(config);
        self.state = DriverState::Configured;
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn config(&self) -> Option<&BenchmarkConfig> {
        self.config.as_ref()
    }

    /// Build the selected runners and execute them
    pub async fn run(&mut self) -> i32 {
        let built = match &self.config {
            Some(config) => build_runners(config).await,
            None => return self.unconfigured(),
        };
        match built {
            Ok(runners) => self.execute(runners).await,
            Err(e) => {
                tracing::error!(category = ?e.category(), "cannot start benchmark: {}", e);
                self.state = DriverState::Done;
                EXIT_NOT_RUNNABLE
            }
        }
    }

    /// Run `runners` in order and return the number that failed
    ///
    /// An empty list, or any runner failing its runnability check, returns
    /// [`EXIT_NOT_RUNNABLE`] before the sink is opened.
    pub async fn execute(&mut self, runners: Vec<Box<dyn BenchmarkRunner>>) -> i32 {
        let config = match &self.config {
            Some(config) => config,
            None => return self.unconfigured(),
        };

        if runners.is_empty() {
            tracing::error!("no runner configured");
            self.state = DriverState::Done;
            return EXIT_NOT_RUNNABLE;
        }

        for runner in &runners {
            if !runner.is_runnable() {
                self.state = DriverState::Done;
                return EXIT_NOT_RUNNABLE;
            }
        }

        let mut out = match StatWriter::open(config.outfile.as_deref()) {
            Ok(out) => out,
            Err(e) => {
                tracing::error!("cannot open statistics output: {}", e);
                self.state = DriverState::Done;
                return EXIT_NOT_RUNNABLE;
            }
        };

        self.state = DriverState::Running;
        let mut summary = RunSummary::new(config.loop_count);
        let mut failed = 0;

        for runner in &runners {
            let name = runner.backend().name();
            if self.cancel.is_cancelled() {
                tracing::warn!(runner = name, "cancelled before start");
                failed += 1;
                continue;
            }

            let mut tally = RunnerTally::new();
            let result = {
                let mut ctx = TrialContext::new(&mut out, &mut tally, &self.cancel);
                runner.run(&mut ctx).await
            };

            let completed = match result {
                Ok(true) => {
                    tracing::info!(runner = name, "run completed");
                    true
                }
                Ok(false) => {
                    tracing::error!(runner = name, "run did not complete");
                    false
                }
                Err(e) => {
                    tracing::error!(runner = name, category = ?e.category(), "run failed: {}", e);
                    false
                }
            };
            if !completed {
                failed += 1;
            }
            let runner_summary = tally.finish(name, completed);
            log_summary(&runner_summary);
            summary.push(runner_summary);
        }

        if let Some(path) = &config.summary_path {
            match summary.save_json(path) {
                Ok(()) => tracing::info!(path = %path.display(), "summary written"),
                Err(e) => tracing::warn!(path = %path.display(), "could not write summary: {}", e),
            }
        }

        self.state = DriverState::Done;
        failed
    }

    fn unconfigured(&mut self) -> i32 {
        tracing::error!("driver has no configuration");
        self.state = DriverState::Done;
        EXIT_NOT_RUNNABLE
    }
}

async fn build_runners(config: &BenchmarkConfig) -> Result<Vec<Box<dyn BenchmarkRunner>>> {
    let backends = config.mode.backends();

    // gate every backend before any connection is attempted
    for backend in backends {
        if let Err(e) = config.validate_for(*backend) {
            tracing::error!(runner = backend.name(), "not runnable: {}", e);
            return Err(e);
        }
    }

    let mut runners: Vec<Box<dyn BenchmarkRunner>> = Vec::with_capacity(backends.len());
    for backend in backends {
        match backend {
            Backend::Mounted => {
                runners.push(Box::new(LocalCopyRunner::new(config.clone())));
            }
            Backend::Direct => {
                let params = config.remote.resolve()?;
                let store = GridFsStore::connect(&params, config.timeout).await?;
                runners.push(Box::new(RemoteObjectRunner::new(config.clone(), store)));
            }
        }
    }
    Ok(runners)
}

fn log_summary(runner: &RunnerSummary) {
    for entry in &runner.entries {
        tracing::info!(
            runner = %runner.runner,
            file = %entry.file,
            op = %entry.op,
            trials = entry.trials,
            bytes = %format_bytes(entry.bytes),
            p50 = %format_latency(entry.latency.p50()),
            p95 = %format_latency(entry.latency.p95()),
            throughput = %format_throughput(entry.throughput_mbps),
            "summary"
        );
    }
}
