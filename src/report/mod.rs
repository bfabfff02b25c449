//! Report module - where progress and results go.
//!
//! The trial engine never logs results itself; it hands them to an injected
//! [`ReportSink`].

mod progress;
mod sink;

pub use progress::*;
pub use sink::*;
