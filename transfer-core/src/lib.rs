//! Transfer core for KundaPay
//!
//! Pricing and domain types for cross-border transfers:
//!
//! 1. **Types**: currencies, corridors, transfer records, beneficiaries
//! 2. **Rates**: canonical exchange-rate and fee tables
//! 3. **Calculator**: forward/reverse quote computation with the XAF
//!    multiple-of-5 rounding policy
//! 4. **References**: collision-safe human-readable correlation codes
//!
//! Everything in this crate is pure and synchronous. All money is
//! [`rust_decimal::Decimal`]; floats never touch an amount.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod beneficiary;
pub mod calculator;
pub mod error;
pub mod rates;
pub mod reference;
pub mod types;

pub use calculator::TransferCalculator;
pub use error::{Error, Result};
pub use rates::{FeeSchedule, RateTable};
pub use reference::TransferReference;
pub use types::*;
