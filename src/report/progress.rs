//! Progress bar sink.

use super::ReportSink;
use crate::models::{ExperimentPlan, ExperimentStats, Tally, TrialResult};
use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}";

/// Trials between message refreshes.
const MESSAGE_EVERY: u64 = 64;

/// Draws an `indicatif` progress bar with the running success count.
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Bar drawn on stderr.
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// Bar that never draws.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden())
    }

    fn with_bar(bar: ProgressBar) -> Self {
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        Self { bar }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for ProgressReporter {
    fn on_start(&mut self, plan: &ExperimentPlan, _strategy: &str, _workers: usize) {
        self.bar.set_length(plan.runs());
        self.bar.set_position(0);
    }

    fn on_trial(&mut self, _trial: &TrialResult, tally: &Tally) {
        self.bar.inc(1);
        if tally.total_trials % MESSAGE_EVERY == 0 {
            self.bar.set_message(format!("successes: {}", tally.successes));
        }
    }

    fn on_finish(&mut self, stats: &ExperimentStats) {
        self.bar.finish_with_message(format!(
            "Done! {} of {} trials succeeded",
            stats.tally.successes, stats.tally.total_trials
        ));
    }
}
