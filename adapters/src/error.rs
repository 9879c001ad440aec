//! Error types for adapters

use thiserror::Error;

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter errors
#[derive(Error, Debug)]
pub enum Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Timeout. An outcome-ambiguous failure: the provider may have
    /// processed the request, so callers must not assume failure.
    #[error("Timeout after {seconds}s: {operation}")]
    Timeout {
        /// Timeout duration
        seconds: u64,
        /// Operation
        operation: String,
    },

    /// Webhook signature did not verify
    #[error("Invalid webhook signature from {0}")]
    InvalidSignature(String),

    /// Webhook payload verified but could not be interpreted
    #[error("Malformed webhook event: {0}")]
    MalformedEvent(String),

    /// Provider API error (the 502 class)
    #[error("Provider {provider} error {status_code}: {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// Payout destination not usable by this connector
    #[error("Unusable payout destination: {0}")]
    Destination(String),

    /// Amount cannot be represented in minor units
    #[error("Amount error: {0}")]
    Amount(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Map a reqwest failure, keeping timeouts distinguishable so the
    /// lifecycle can treat them as ambiguous instead of failed.
    pub fn from_request(e: reqwest::Error, operation: &str, timeout_seconds: u64) -> Self {
        if e.is_timeout() {
            Error::Timeout {
                seconds: timeout_seconds,
                operation: operation.to_string(),
            }
        } else {
            Error::Connection(format!("{operation}: {e}"))
        }
    }

    /// True when the outcome at the provider is unknown
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
