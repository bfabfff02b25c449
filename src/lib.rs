//! prisoners - Monte Carlo simulator for the 100 prisoners problem.
//!
//! ## Architecture
//!
//! - **Room**: random box contents (`Permutation`) and how a prisoner
//!   searches them (`SearchStrategy`, `CycleFollowing`)
//! - **Pipeline**: one trial (`TrialEvaluator`) and a whole experiment
//!   (`ExperimentRunner`)
//! - **Pool**: optional parallel execution of trials (`WorkerPool`)
//! - **Report**: injected sinks for progress and results (`ReportSink`)
//! - **Analysis**: exact success probability to check simulations against
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Permutations are bijections by construction, limits >= 1
//! - B_i (Beliefs): Config and hand-built inputs are fallible (Result)
//! - I^R (Resolvable): Runs, prisoners, limit, seed and workers are configurable

pub mod analysis;
pub mod models;
pub mod pipeline;
pub mod pool;
pub mod report;
pub mod room;

// Re-exports for convenience
pub use analysis::{asymptotic_success_rate, group_success_probability};
pub use models::{
    Config, ConfigError, ExperimentPlan, ExperimentStats, PrisonerId, Result, SearchOutcome,
    SimError, Tally, TrialResult,
};
pub use pipeline::{ExperimentRunner, TrialEvaluator};
pub use pool::WorkerPool;
pub use report::{ProgressReporter, ReportSink, Reporters, TracingReporter};
pub use room::{CycleFollowing, Permutation, SearchStrategy};
