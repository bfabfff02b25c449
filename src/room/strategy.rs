//! Search strategies.
//!
//! K_i: Every permutation splits into disjoint cycles. Following
//! content-as-next-box from box `p` walks the cycle holding `p`, so prisoner
//! `p` succeeds iff that cycle is no longer than the limit.

use super::Permutation;
use crate::models::{PrisonerId, SearchOutcome};
use tracing::trace;

/// How a single prisoner picks boxes.
///
/// Implementations must be deterministic for a given permutation; any
/// randomness belongs in the permutation itself.
pub trait SearchStrategy: Send + Sync {
    /// Short name used in reports.
    fn name(&self) -> &'static str;

    /// Search for `prisoner`'s number opening at most `limit` boxes.
    ///
    /// A zero limit opens nothing and reports [`SearchOutcome::NotFound`];
    /// [`ExperimentPlan`](crate::models::ExperimentPlan) never carries one.
    fn search(&self, boxes: &Permutation, prisoner: PrisonerId, limit: usize) -> SearchOutcome;
}

/// Start at your own box, then open the box named by what you just read.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleFollowing;

impl SearchStrategy for CycleFollowing {
    fn name(&self) -> &'static str {
        "cycle-following"
    }

    fn search(&self, boxes: &Permutation, prisoner: PrisonerId, limit: usize) -> SearchOutcome {
        let mut box_index = prisoner;
        for opens in 1..=limit {
            let found = boxes.open(box_index);
            trace!(prisoner, opens, box_index, found, "Opened box");
            if found == prisoner {
                return SearchOutcome::Found { opens };
            }
            box_index = found;
        }
        SearchOutcome::NotFound
    }
}
