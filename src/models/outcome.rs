//! Outcome and statistics types for prisoners.
//!
//! K_i: These types represent the data flowing out of the trial engine.

use super::ExperimentPlan;
use crate::analysis::group_success_probability;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prisoner identity. Also the index of that prisoner's entry box.
pub type PrisonerId = usize;

/// Result of one prisoner's search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// Own number found after `opens` boxes (1-based)
    Found { opens: usize },
    /// Limit reached without finding the number
    NotFound,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    /// Boxes opened before success, if any.
    pub fn opens(&self) -> Option<usize> {
        match self {
            Self::Found { opens } => Some(*opens),
            Self::NotFound => None,
        }
    }
}

/// Per-prisoner detail kept when diagnostics are enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialDiagnostics {
    /// Opens needed by each prisoner, indexed by prisoner id
    pub open_counts: Vec<usize>,

    /// Prisoners whose count is within the open limit
    pub within_limit: usize,

    /// Length of the longest cycle (= largest open count)
    pub longest_cycle: usize,
}

impl TrialDiagnostics {
    pub fn average_opens(&self) -> f64 {
        if self.open_counts.is_empty() {
            return 0.0;
        }
        self.open_counts.iter().sum::<usize>() as f64 / self.open_counts.len() as f64
    }
}

/// Aggregate over all prisoners of one trial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Trial index within the experiment
    pub index: u64,

    /// Every prisoner found their number
    pub group_success: bool,

    /// Prisoners that actually searched (fewer than N after a short-circuit)
    pub prisoners_evaluated: usize,

    /// Prisoners that found their number within the limit
    pub prisoners_succeeded: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<TrialDiagnostics>,
}

/// Running counters. Merging is plain addition, so partial tallies from
/// parallel workers can be combined in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub total_trials: u64,
    pub successes: u64,
    pub prisoners_evaluated: u64,
    pub prisoners_succeeded: u64,
}

impl Tally {
    /// Count one finished trial.
    pub fn record(&mut self, trial: &TrialResult) {
        self.total_trials += 1;
        if trial.group_success {
            self.successes += 1;
        }
        self.prisoners_evaluated += trial.prisoners_evaluated as u64;
        self.prisoners_succeeded += trial.prisoners_succeeded as u64;
    }

    pub fn merge(&mut self, other: &Tally) {
        self.total_trials += other.total_trials;
        self.successes += other.successes;
        self.prisoners_evaluated += other.prisoners_evaluated;
        self.prisoners_succeeded += other.prisoners_succeeded;
    }
}

/// Statistics for a whole experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentStats {
    /// Unique identifier for this run
    pub run_id: String,

    pub started_at: DateTime<Utc>,

    /// Search strategy name
    pub strategy: String,

    pub prisoners: usize,
    pub open_limit: usize,
    pub seed: u64,
    pub workers: usize,

    /// Counters
    #[serde(flatten)]
    pub tally: Tally,

    /// Group success rate (0.0 - 1.0)
    pub success_rate: f64,

    /// Binomial standard error of `success_rate`
    pub standard_error: f64,

    /// Exact probability that the group goes free
    pub expected_rate: f64,

    /// Total runtime in seconds
    pub runtime_secs: f64,

    pub trials_per_sec: f64,
}

impl ExperimentStats {
    pub fn new(plan: &ExperimentPlan, strategy: &str, workers: usize) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            strategy: strategy.to_string(),
            prisoners: plan.prisoners(),
            open_limit: plan.open_limit(),
            seed: plan.seed(),
            workers,
            tally: Tally::default(),
            success_rate: 0.0,
            standard_error: 0.0,
            expected_rate: 0.0,
            runtime_secs: 0.0,
            trials_per_sec: 0.0,
        }
    }

    /// Calculate derived stats.
    pub fn finalize(&mut self, runtime_secs: f64) {
        self.runtime_secs = runtime_secs;
        let n = self.tally.total_trials;
        if n > 0 {
            let p = self.tally.successes as f64 / n as f64;
            self.success_rate = p;
            self.standard_error = (p * (1.0 - p) / n as f64).sqrt();
        }
        self.expected_rate = group_success_probability(self.prisoners, self.open_limit);
        if runtime_secs > 0.0 {
            self.trials_per_sec = n as f64 / runtime_secs;
        }
    }

    pub fn success_percentage(&self) -> f64 {
        self.success_rate * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trial(index: u64, group_success: bool, evaluated: usize, succeeded: usize) -> TrialResult {
        TrialResult {
            index,
            group_success,
            prisoners_evaluated: evaluated,
            prisoners_succeeded: succeeded,
            diagnostics: None,
        }
    }

    #[test]
    fn test_tally_merge_matches_sequential_record() {
        let trials = vec![
            trial(0, true, 4, 4),
            trial(1, false, 1, 0),
            trial(2, false, 3, 2),
            trial(3, true, 4, 4),
        ];

        let mut sequential = Tally::default();
        trials.iter().for_each(|t| sequential.record(t));

        let mut left = Tally::default();
        let mut right = Tally::default();
        trials[..1].iter().for_each(|t| left.record(t));
        trials[1..].iter().for_each(|t| right.record(t));

        let mut merged = right;
        merged.merge(&left);
        assert_eq!(merged, sequential);
        assert_eq!(sequential.successes, 2);
        assert_eq!(sequential.prisoners_evaluated, 12);
        assert_eq!(sequential.prisoners_succeeded, 10);
    }

    #[test]
    fn test_finalize_computes_rate() {
        let plan = ExperimentPlan::new(4, 4, 2, 1).unwrap();
        let mut stats = ExperimentStats::new(&plan, "cycle-following", 1);
        stats.tally.record(&trial(0, true, 4, 4));
        stats.tally.record(&trial(1, false, 1, 0));
        stats.tally.record(&trial(2, false, 1, 0));
        stats.tally.record(&trial(3, true, 4, 4));
        stats.finalize(2.0);

        assert_eq!(stats.success_rate, 0.5);
        assert_eq!(stats.success_percentage(), 50.0);
        assert_eq!(stats.standard_error, 0.25);
        assert_eq!(stats.trials_per_sec, 2.0);
        // 4 prisoners, limit 2: all cycles <= 2 in 10 of 24 permutations
        assert!((stats.expected_rate - 10.0 / 24.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_opens() {
        let diag = TrialDiagnostics {
            open_counts: vec![2, 2, 1, 3],
            within_limit: 3,
            longest_cycle: 3,
        };
        assert_eq!(diag.average_opens(), 2.0);
    }

    #[test]
    fn test_stats_serialize_flat() {
        let plan = ExperimentPlan::new(1, 2, 1, 9).unwrap();
        let stats = ExperimentStats::new(&plan, "cycle-following", 1);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["seed"], 9);
        assert_eq!(json["successes"], 0);
        assert!(json.get("tally").is_none());
    }
}
