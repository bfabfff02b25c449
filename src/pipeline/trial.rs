//! Trial evaluation.
//!
//! Trial flow:
//! Seed → Permutation → every prisoner searches → group verdict
//!
//! K_i: One failing prisoner dooms the group, so the default mode stops at
//! the first failure. Diagnostics mode searches every prisoner without a
//! limit and keeps the open counts.

use crate::models::{ExperimentPlan, Result, SimError, TrialDiagnostics, TrialResult};
use crate::room::{CycleFollowing, Permutation, SearchStrategy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generator for trial `index` of an experiment seeded with `seed`.
///
/// Each trial owns its randomness, so results do not depend on which
/// worker runs the trial or in what order. The seed picks the key and the
/// index picks the ChaCha stream, so neighbouring seeds share no trials.
pub fn trial_rng(seed: u64, index: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(index);
    rng
}

/// Runs one trial: draw boxes, let every prisoner search, decide the group.
#[derive(Debug, Clone)]
pub struct TrialEvaluator<S = CycleFollowing> {
    strategy: S,
    prisoners: usize,
    open_limit: usize,
    diagnostics: bool,
}

impl TrialEvaluator<CycleFollowing> {
    /// Evaluator using the cycle-following strategy.
    pub fn cycle_following(plan: &ExperimentPlan) -> Self {
        Self::new(plan, CycleFollowing)
    }
}

impl<S: SearchStrategy> TrialEvaluator<S> {
    pub fn new(plan: &ExperimentPlan, strategy: S) -> Self {
        Self {
            strategy,
            prisoners: plan.prisoners(),
            open_limit: plan.open_limit(),
            diagnostics: plan.diagnostics(),
        }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Evaluate trial `index` with randomness drawn from `rng`.
    pub fn evaluate<R: Rng + ?Sized>(&self, index: u64, rng: &mut R) -> Result<TrialResult> {
        let boxes = Permutation::random(self.prisoners, rng)?;
        self.evaluate_permutation(index, &boxes)
    }

    /// Evaluate trial `index` of an experiment seeded with `seed`.
    pub fn evaluate_seeded(&self, seed: u64, index: u64) -> Result<TrialResult> {
        self.evaluate(index, &mut trial_rng(seed, index))
    }

    /// Evaluate a given set of boxes.
    pub fn evaluate_permutation(&self, index: u64, boxes: &Permutation) -> Result<TrialResult> {
        if boxes.len() != self.prisoners {
            return Err(SimError::InvalidInput(format!(
                "permutation has {} boxes, trial expects {}",
                boxes.len(),
                self.prisoners
            )));
        }

        if self.diagnostics {
            return Ok(self.evaluate_exhaustive(index, boxes));
        }

        let mut evaluated = 0;
        let mut succeeded = 0;
        for prisoner in 0..self.prisoners {
            evaluated += 1;
            if !self
                .strategy
                .search(boxes, prisoner, self.open_limit)
                .is_found()
            {
                break;
            }
            succeeded += 1;
        }

        Ok(TrialResult {
            index,
            group_success: succeeded == self.prisoners,
            prisoners_evaluated: evaluated,
            prisoners_succeeded: succeeded,
            diagnostics: None,
        })
    }

    fn evaluate_exhaustive(&self, index: u64, boxes: &Permutation) -> TrialResult {
        let n = self.prisoners;
        let mut open_counts = Vec::with_capacity(n);
        let mut within_limit = 0;

        for prisoner in 0..n {
            // Unbounded search; a miss means all n boxes were opened.
            let outcome = self.strategy.search(boxes, prisoner, n);
            let opens = outcome.opens().unwrap_or(n);
            if outcome.is_found() && opens <= self.open_limit {
                within_limit += 1;
            }
            open_counts.push(opens);
        }

        TrialResult {
            index,
            group_success: within_limit == n,
            prisoners_evaluated: n,
            prisoners_succeeded: within_limit,
            diagnostics: Some(TrialDiagnostics {
                open_counts,
                within_limit,
                longest_cycle: boxes.longest_cycle(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plan(prisoners: usize, open_limit: usize) -> ExperimentPlan {
        ExperimentPlan::new(1, prisoners, open_limit, 0).unwrap()
    }

    fn perm(contents: &[usize]) -> Permutation {
        Permutation::from_contents(contents.to_vec()).unwrap()
    }

    #[test]
    fn test_two_swaps_group_succeeds() {
        let evaluator = TrialEvaluator::cycle_following(&plan(4, 2));
        let result = evaluator.evaluate_permutation(0, &perm(&[1, 0, 3, 2])).unwrap();
        assert!(result.group_success);
        assert_eq!(result.prisoners_evaluated, 4);
        assert_eq!(result.prisoners_succeeded, 4);
    }

    #[test]
    fn test_four_cycle_short_circuits_on_first_prisoner() {
        let evaluator = TrialEvaluator::cycle_following(&plan(4, 2));
        let result = evaluator.evaluate_permutation(0, &perm(&[1, 2, 3, 0])).unwrap();
        assert!(!result.group_success);
        assert_eq!(result.prisoners_evaluated, 1);
        assert_eq!(result.prisoners_succeeded, 0);
    }

    #[test]
    fn test_diagnostics_keep_full_distribution() {
        let evaluator = TrialEvaluator::cycle_following(&plan(4, 2).with_diagnostics(true));

        let result = evaluator.evaluate_permutation(3, &perm(&[1, 2, 3, 0])).unwrap();
        assert!(!result.group_success);
        assert_eq!(result.index, 3);
        let diag = result.diagnostics.unwrap();
        assert_eq!(diag.open_counts, vec![4, 4, 4, 4]);
        assert_eq!(diag.within_limit, 0);
        assert_eq!(diag.longest_cycle, 4);

        let result = evaluator.evaluate_permutation(4, &perm(&[1, 0, 3, 2])).unwrap();
        assert!(result.group_success);
        let diag = result.diagnostics.unwrap();
        assert_eq!(diag.open_counts, vec![2, 2, 2, 2]);
        assert_eq!(diag.average_opens(), 2.0);
    }

    #[test]
    fn test_two_prisoners_only_identity_succeeds() {
        let evaluator = TrialEvaluator::cycle_following(&plan(2, 1));
        assert!(evaluator.evaluate_permutation(0, &perm(&[0, 1])).unwrap().group_success);
        assert!(!evaluator.evaluate_permutation(0, &perm(&[1, 0])).unwrap().group_success);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let evaluator = TrialEvaluator::cycle_following(&plan(4, 2));
        let err = evaluator.evaluate_permutation(0, &perm(&[1, 0])).unwrap_err();
        assert!(matches!(err, SimError::InvalidInput(_)));
    }

    #[test]
    fn test_seeded_trials_are_reproducible() {
        let evaluator = TrialEvaluator::cycle_following(&plan(100, 50).with_diagnostics(true));
        let first: Vec<_> = (0..20)
            .map(|i| evaluator.evaluate_seeded(77, i).unwrap())
            .collect();
        let second: Vec<_> = (0..20)
            .map(|i| evaluator.evaluate_seeded(77, i).unwrap())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_neighbouring_seeds_do_not_share_trials() {
        let draw = |seed, index| Permutation::random(100, &mut trial_rng(seed, index)).unwrap();

        let shifted = (0..500)
            .filter(|&i| draw(0, i + 1) == draw(1, i))
            .count();
        assert_eq!(shifted, 0);

        let evaluator = TrialEvaluator::cycle_following(&plan(100, 50).with_diagnostics(true));
        for i in 0..50 {
            let a = evaluator.evaluate_seeded(0, i + 1).unwrap().diagnostics.unwrap();
            let b = evaluator.evaluate_seeded(1, i).unwrap().diagnostics.unwrap();
            assert_ne!(a.open_counts, b.open_counts);
        }
    }

    #[test]
    fn test_trial_streams_differ_within_a_seed() {
        let first = Permutation::random(100, &mut trial_rng(9, 0)).unwrap();
        let second = Permutation::random(100, &mut trial_rng(9, 1)).unwrap();
        assert_ne!(first, second);
    }

    proptest! {
        #[test]
        fn prop_group_success_iff_longest_cycle_within_limit(
            n in 2usize..80,
            seed in any::<u64>(),
            index in 0u64..1000,
        ) {
            let limit = n / 2;
            let fast = TrialEvaluator::cycle_following(&plan(n, limit));
            let full = TrialEvaluator::cycle_following(&plan(n, limit).with_diagnostics(true));

            let boxes = Permutation::random(n, &mut trial_rng(seed, index)).unwrap();
            let oracle = boxes.longest_cycle() <= limit;

            prop_assert_eq!(fast.evaluate_permutation(index, &boxes).unwrap().group_success, oracle);
            let detailed = full.evaluate_permutation(index, &boxes).unwrap();
            prop_assert_eq!(detailed.group_success, oracle);
            prop_assert_eq!(
                detailed.diagnostics.unwrap().open_counts,
                (0..n).map(|p| boxes.cycle_length_of(p)).collect::<Vec<_>>()
            );
        }
    }
}
