//! Report sinks.
//!
//! Epistemic foundation:
//! - K_i: Sinks observe an experiment, they never change its outcome
//! - K_i: `on_trial` is called once per trial, in trial-index order
//! - I^R: Which sinks are attached is decided by the caller

use crate::models::{ExperimentPlan, ExperimentStats, Tally, TrialResult};
use tracing::{debug, info};

/// Receives structured records from a running experiment.
pub trait ReportSink: Send {
    /// Called once before the first trial.
    fn on_start(&mut self, _plan: &ExperimentPlan, _strategy: &str, _workers: usize) {}

    /// Called after each trial with the counters including that trial.
    fn on_trial(&mut self, _trial: &TrialResult, _tally: &Tally) {}

    /// Called once with the finalized statistics.
    fn on_finish(&mut self, _stats: &ExperimentStats) {}
}

/// Emits records as `tracing` events.
///
/// Summary lines go out at INFO, per-trial lines at DEBUG.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ReportSink for TracingReporter {
    fn on_start(&mut self, plan: &ExperimentPlan, strategy: &str, workers: usize) {
        info!(
            runs = plan.runs(),
            prisoners = plan.prisoners(),
            open_limit = plan.open_limit(),
            seed = plan.seed(),
            strategy,
            workers,
            "Starting simulation"
        );
    }

    fn on_trial(&mut self, trial: &TrialResult, tally: &Tally) {
        debug!(
            trial = trial.index,
            group_success = trial.group_success,
            succeeded = trial.prisoners_succeeded,
            evaluated = trial.prisoners_evaluated,
            successes_so_far = tally.successes,
            "Trial complete"
        );

        if let Some(diag) = &trial.diagnostics {
            debug!(
                trial = trial.index,
                average_opens = format!("{:.1}", diag.average_opens()),
                within_limit = diag.within_limit,
                longest_cycle = diag.longest_cycle,
                "Trial diagnostics"
            );
        }
    }

    fn on_finish(&mut self, stats: &ExperimentStats) {
        info!(
            trials = stats.tally.total_trials,
            successes = stats.tally.successes,
            success_rate = format!("{:.1}%", stats.success_percentage()),
            expected_rate = format!("{:.1}%", stats.expected_rate * 100.0),
            runtime = format!("{:.2}s", stats.runtime_secs),
            "Simulation complete"
        );
    }
}

/// Fans records out to several sinks in insertion order.
#[derive(Default)]
pub struct Reporters {
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Reporters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl ReportSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl ReportSink for Reporters {
    fn on_start(&mut self, plan: &ExperimentPlan, strategy: &str, workers: usize) {
        for sink in &mut self.sinks {
            sink.on_start(plan, strategy, workers);
        }
    }

    fn on_trial(&mut self, trial: &TrialResult, tally: &Tally) {
        for sink in &mut self.sinks {
            sink.on_trial(trial, tally);
        }
    }

    fn on_finish(&mut self, stats: &ExperimentStats) {
        for sink in &mut self.sinks {
            sink.on_finish(stats);
        }
    }
}
