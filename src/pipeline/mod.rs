//! Pipeline module - trial evaluation and experiment runs.

mod experiment;
mod trial;

pub use experiment::*;
pub use trial::*;
