//! Experiment runner.
//!
//! Pipeline flow:
//! Plan → N independent trials (sequential or pooled) → Tally → ExperimentStats
//!
//! K_i: The only state across trials is the monotonic tally. A group
//! failure is counted, never retried.

use super::{TrialEvaluator, trial_rng};
use crate::models::{Config, ExperimentPlan, ExperimentStats, Result, TrialResult};
use crate::pool::WorkerPool;
use crate::report::ReportSink;
use crate::room::{CycleFollowing, SearchStrategy};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Default trials per worker batch.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Runs all trials of an experiment and produces its statistics.
pub struct ExperimentRunner<S = CycleFollowing> {
    plan: ExperimentPlan,
    evaluator: Arc<TrialEvaluator<S>>,
    pool: WorkerPool,
}

impl ExperimentRunner<CycleFollowing> {
    /// Create a cycle-following runner from configuration.
    ///
    /// Draws the seed if the config has none.
    pub fn from_config(config: &Config) -> Result<Self> {
        let plan = config.plan()?;
        Ok(Self::new(plan, CycleFollowing)
            .with_workers(config.execution.workers, config.execution.batch_size))
    }
}

impl<S: SearchStrategy + 'static> ExperimentRunner<S> {
    /// Sequential runner for `plan` using `strategy`.
    pub fn new(plan: ExperimentPlan, strategy: S) -> Self {
        Self {
            evaluator: Arc::new(TrialEvaluator::new(&plan, strategy)),
            plan,
            pool: WorkerPool::new(1, DEFAULT_BATCH_SIZE),
        }
    }

    /// Use `workers` parallel workers (1 keeps the sequential loop).
    pub fn with_workers(mut self, workers: usize, batch_size: usize) -> Self {
        self.pool = WorkerPool::new(workers, batch_size);
        self
    }

    pub fn plan(&self) -> &ExperimentPlan {
        &self.plan
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Run the experiment, on the worker pool if more than one worker is
    /// configured.
    ///
    /// Both paths give identical statistics for the same plan.
    pub async fn run(&self, sink: &mut dyn ReportSink) -> Result<ExperimentStats> {
        if self.pool.workers() == 1 {
            return self.run_sequential(sink);
        }

        let start = Instant::now();
        let mut stats = self.begin(sink);
        stats.tally = self
            .pool
            .run(&self.plan, Arc::clone(&self.evaluator), sink)
            .await?;
        Ok(self.finish(stats, start, sink))
    }

    /// Run every trial on the current thread.
    ///
    /// Trial `i` draws from its own generator seeded by `(seed, i)`.
    pub fn run_sequential(&self, sink: &mut dyn ReportSink) -> Result<ExperimentStats> {
        let seed = self.plan.seed();
        self.run_loop(sink, |evaluator, index| {
            evaluator.evaluate(index, &mut trial_rng(seed, index))
        })
    }

    /// Run every trial on the current thread, drawing all randomness from
    /// the caller's generator.
    ///
    /// Useful when the caller owns the random source. The per-trial sequence
    /// then differs from [`run`](Self::run) for the same plan seed.
    pub fn run_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        sink: &mut dyn ReportSink,
    ) -> Result<ExperimentStats> {
        self.run_loop(sink, |evaluator, index| evaluator.evaluate(index, &mut *rng))
    }

    fn run_loop<F>(&self, sink: &mut dyn ReportSink, mut trial: F) -> Result<ExperimentStats>
    where
        F: FnMut(&TrialEvaluator<S>, u64) -> Result<TrialResult>,
    {
        let start = Instant::now();
        let mut stats = self.begin(sink);

        for index in 0..self.plan.runs() {
            let result = trial(&self.evaluator, index)?;
            stats.tally.record(&result);
            sink.on_trial(&result, &stats.tally);
        }

        Ok(self.finish(stats, start, sink))
    }

    fn begin(&self, sink: &mut dyn ReportSink) -> ExperimentStats {
        let strategy = self.evaluator.strategy().name();
        let stats = ExperimentStats::new(&self.plan, strategy, self.pool.workers());
        info!(run_id = %stats.run_id, seed = self.plan.seed(), "Experiment planned");
        sink.on_start(&self.plan, strategy, self.pool.workers());
        stats
    }

    fn finish(
        &self,
        mut stats: ExperimentStats,
        start: Instant,
        sink: &mut dyn ReportSink,
    ) -> ExperimentStats {
        stats.finalize(start.elapsed().as_secs_f64());
        sink.on_finish(&stats);
        stats
    }
}
