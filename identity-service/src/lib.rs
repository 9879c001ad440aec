//! Identity verification bridge for KundaPay
//!
//! Delegates KYC to an external verification provider: applicant and
//! check creation on first attempt, HMAC-verified webhook ingestion to
//! sync the outcome, and an idempotent short-circuit for users who are
//! already verified. A `clear` result is terminal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bridge;
pub mod error;
pub mod provider;
pub mod types;

pub use bridge::{IdentityBridge, VerificationSession, WebhookOutcome};
pub use error::{Error, Result};
pub use provider::{IdentityProvider, OnfidoClient};
pub use types::{ApplicantDetails, CheckResult, IdentityStatus, IdentityStore, MemoryIdentityStore, UserIdentity};
