//! Error types for the transfer core

use rust_decimal::Decimal;
use thiserror::Error;

/// Transfer core error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Corridor is not in the fee schedule
    #[error("Unsupported direction: {0}")]
    UnsupportedDirection(String),

    /// Currency pair is not in the rate table
    #[error("Unknown currency pair: {from}/{to}")]
    UnknownPair {
        /// Source currency code
        from: &'static str,
        /// Target currency code
        to: &'static str,
    },

    /// Amount must be strictly positive
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Payout destination does not match the receiving method
    #[error("Invalid payout details for {method}: {reason}")]
    InvalidPayoutDetails {
        /// Receiving method the details were validated against
        method: String,
        /// What failed
        reason: String,
    },

    /// Transfer reference failed shape or checksum validation
    #[error("Invalid transfer reference: {0}")]
    InvalidReference(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
