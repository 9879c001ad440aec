//! Shared types for adapters

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use transfer_core::{Currency, PayoutDetails};

use crate::error::{Error, Result};

/// Payment provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Stripe (card collection)
    Stripe,
    /// Checkout.com (hosted payment collection)
    Checkout,
    /// Airtel Money (mobile-money payout)
    AirtelMoney,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Stripe => write!(f, "stripe"),
            Provider::Checkout => write!(f, "checkout"),
            Provider::AirtelMoney => write!(f, "airtel_money"),
        }
    }
}

/// Request to collect funds from the sender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRequest {
    /// Amount in major units (converted at the provider boundary)
    pub amount: Decimal,
    /// Collection currency
    pub currency: Currency,
    /// Transfer reference, echoed back by the provider webhook
    pub reference: String,
    /// Extra metadata forwarded to the provider
    pub metadata: HashMap<String, String>,
}

/// Provider-side collection session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSession {
    /// Provider that owns the session
    pub provider: Provider,
    /// Provider session / payment-intent id
    pub session_id: String,
    /// Client secret for SDK-driven confirmation, when applicable
    pub client_secret: Option<String>,
    /// Redirect URL for hosted pages, when applicable
    pub redirect_url: Option<String>,
}

/// Normalized webhook outcome consumed by the transfer lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Originating provider
    pub provider: Provider,
    /// Transfer reference the provider echoed back
    pub reference: String,
    /// What happened
    pub kind: PaymentEventKind,
}

/// Webhook event kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentEventKind {
    /// Funds collected
    Succeeded {
        /// Provider payment id
        payment_id: String,
    },
    /// Collection failed
    Failed {
        /// Provider-reported reason
        reason: String,
    },
}

/// Request to pay out to a beneficiary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutRequest {
    /// Transfer reference
    pub reference: String,
    /// Amount in major units
    pub amount: Decimal,
    /// Payout currency
    pub currency: Currency,
    /// Validated destination
    pub destination: PayoutDetails,
}

/// Payout outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponse {
    /// Transfer reference
    pub reference: String,
    /// Provider status
    pub status: PayoutStatus,
    /// Provider transaction id
    pub provider_transaction_id: Option<String>,
    /// Provider message
    pub message: Option<String>,
}

/// Payout status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    /// Accepted by the provider, delivery in flight
    Accepted,
    /// Delivered to the wallet
    Completed,
    /// Rejected or failed
    Failed,
}

/// Convert a major-unit amount to the provider's minor units.
///
/// Uses the ISO 4217 exponent (XAF has none) and rounds half away from
/// zero. Truncation would drift against the quoted amount.
pub fn to_minor_units(amount: Decimal, currency: Currency) -> Result<i64> {
    let exponent = currency.minor_unit_exponent();
    let scaled = amount
        .checked_mul(Decimal::from(10i64.pow(exponent)))
        .ok_or_else(|| Error::Amount(format!("{amount} {currency} out of minor-unit range")))?;
    scaled
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| Error::Amount(format!("{amount} {currency} out of minor-unit range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minor_units_two_decimal_currencies() {
        assert_eq!(to_minor_units(dec!(12.34), Currency::EUR).unwrap(), 1234);
        assert_eq!(to_minor_units(dec!(0.01), Currency::USD).unwrap(), 1);
        // Round, never truncate
        assert_eq!(to_minor_units(dec!(12.345), Currency::EUR).unwrap(), 1235);
        assert_eq!(to_minor_units(dec!(12.344), Currency::EUR).unwrap(), 1234);
    }

    #[test]
    fn test_minor_units_xaf_has_no_exponent() {
        assert_eq!(to_minor_units(dec!(64280), Currency::XAF).unwrap(), 64280);
        assert_eq!(to_minor_units(dec!(64280.4), Currency::XAF).unwrap(), 64280);
    }

    #[test]
    fn test_minor_units_overflow() {
        let huge = Decimal::MAX;
        assert!(to_minor_units(huge, Currency::EUR).is_err());
    }
}
