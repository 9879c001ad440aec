//! Error types for the identity bridge

use thiserror::Error;

/// Identity bridge error
#[derive(Debug, Error)]
pub enum Error {
    /// Webhook signature did not verify
    #[error("Invalid identity webhook signature")]
    InvalidSignature,

    /// Verification provider API error
    #[error("Identity provider error {status_code}: {message}")]
    Provider {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// Connection failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Webhook references a check we never created
    #[error("Unknown check: {0}")]
    UnknownCheck(String),

    /// Payload verified but could not be interpreted
    #[error("Malformed webhook payload: {0}")]
    Malformed(String),

    /// Persistence failure
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
