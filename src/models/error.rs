//! Error types for prisoners.
//!
//! Epistemic taxonomy:
//! - B_i falsified: Expected failures (bad config, mismatched input)
//! - K_i violated: Internal invariant violations (bugs)
//!
//! A trial in which the group does not go free is NOT an error. It is a
//! simulation outcome and is counted like any other.

use thiserror::Error;

/// Top-level error type for prisoners.
#[derive(Debug, Error)]
pub enum SimError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED — Belief proven wrong (expected failures)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ═══════════════════════════════════════════════════════════════════
    // K_i VIOLATED — Invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Permutation of size {size} is not a bijection: {detail}")]
    NotABijection { size: usize, detail: String },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),
}

impl SimError {
    /// Whether this error means the statistics of the run are meaningless.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::NotABijection { .. }
                | Self::Internal(_)
                | Self::ChannelClosed
                | Self::WorkerPanicked(_)
        )
    }
}

/// Result type alias for prisoners.
pub type Result<T> = std::result::Result<T, SimError>;
