//! Box contents for one trial.
//!
//! Epistemic foundation:
//! - K_i: Box `b` holds exactly one prisoner id; every id is in exactly one box
//! - K_i: Randomness comes from the caller's generator, never ambient state
//! - B_i: A hand-built permutation may be invalid → Result

use crate::models::{PrisonerId, Result, SimError};
use rand::seq::SliceRandom;
use rand::Rng;

/// A bijection from box index to prisoner id over `[0, n)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    contents: Vec<PrisonerId>,
}

impl Permutation {
    /// Draw a uniformly random permutation of size `n`.
    ///
    /// Shuffles the ids `0..n` and assigns them to boxes in index order.
    pub fn random<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Self> {
        let mut contents: Vec<PrisonerId> = (0..n).collect();
        contents.shuffle(rng);
        Self::from_contents(contents)
    }

    /// Build from explicit box contents, checking the bijection.
    pub fn from_contents(contents: Vec<PrisonerId>) -> Result<Self> {
        let n = contents.len();
        let mut seen_in: Vec<Option<usize>> = vec![None; n];

        for (box_index, &prisoner) in contents.iter().enumerate() {
            if prisoner >= n {
                return Err(SimError::NotABijection {
                    size: n,
                    detail: format!("box {box_index} holds out-of-range prisoner {prisoner}"),
                });
            }
            if let Some(first) = seen_in[prisoner] {
                return Err(SimError::NotABijection {
                    size: n,
                    detail: format!("prisoner {prisoner} appears in boxes {first} and {box_index}"),
                });
            }
            seen_in[prisoner] = Some(box_index);
        }

        Ok(Self { contents })
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// Prisoner id found in `box_index`.
    ///
    /// Panics if `box_index >= len()`.
    #[inline]
    pub fn open(&self, box_index: usize) -> PrisonerId {
        self.contents[box_index]
    }

    pub fn contents(&self) -> &[PrisonerId] {
        &self.contents
    }

    /// Length of the cycle that contains `prisoner`.
    pub fn cycle_length_of(&self, prisoner: PrisonerId) -> usize {
        let mut length = 1;
        let mut current = self.contents[prisoner];
        while current != prisoner {
            current = self.contents[current];
            length += 1;
        }
        length
    }

    /// Lengths of all disjoint cycles, in order of their smallest member.
    pub fn cycle_lengths(&self) -> Vec<usize> {
        let mut visited = vec![false; self.contents.len()];
        let mut lengths = Vec::new();

        for start in 0..self.contents.len() {
            if visited[start] {
                continue;
            }
            let mut length = 0;
            let mut current = start;
            while !visited[current] {
                visited[current] = true;
                current = self.contents[current];
                length += 1;
            }
            lengths.push(length);
        }

        lengths
    }

    pub fn longest_cycle(&self) -> usize {
        self.cycle_lengths().into_iter().max().unwrap_or(0)
    }
}
