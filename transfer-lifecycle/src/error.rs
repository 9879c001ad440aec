//! Error types for the transfer lifecycle

use thiserror::Error;
use transfer_core::TransferStatus;

/// Lifecycle error
#[derive(Debug, Error)]
pub enum Error {
    /// No transfer with this reference
    #[error("Transfer not found: {0}")]
    NotFound(String),

    /// Domain validation failed (amounts, corridors, payout details)
    #[error(transparent)]
    Domain(#[from] transfer_core::Error),

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(String),

    /// The requested transition is not legal from the current status
    #[error("Invalid transition for {reference}: {current} -> {attempted}")]
    InvalidTransition {
        /// Transfer reference
        reference: String,
        /// Status found at update time
        current: TransferStatus,
        /// Status the caller tried to reach
        attempted: TransferStatus,
    },

    /// Payout attempt failed; the transfer has been marked failed as a
    /// compensating action and a notification queued
    #[error("Payout failed for {reference}: {message}")]
    PayoutFailed {
        /// Transfer reference
        reference: String,
        /// Provider-reported reason
        message: String,
    },

    /// Payout outcome unknown (timeout). The transfer keeps its current
    /// status and goes to manual reconciliation; assuming failure here
    /// risks a double payout on client retry.
    #[error("Payout outcome ambiguous for {reference}, escalate for reconciliation")]
    Ambiguous {
        /// Transfer reference
        reference: String,
    },
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
