//! Room module - the boxes and how prisoners search them.

mod permutation;
mod strategy;

pub use permutation::*;
pub use strategy::*;
