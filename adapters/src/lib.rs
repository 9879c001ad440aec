//! # KundaPay Adapters
//!
//! Payment-provider connectivity layer:
//! - Collection connectors (Stripe, Checkout.com) with verified webhooks
//! - Mobile-money payout connector (Airtel Money)
//! - Market price feeds (Binance, CoinGecko) for rate refresh
//!
//! Each connector is a stateless request/response translator that
//! normalizes one upstream protocol into the internal transfer-update
//! contract ([`types::PaymentEvent`]). Webhook payloads are only trusted
//! after HMAC verification, and amounts cross this boundary in minor
//! currency units.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod airtel;
pub mod checkout;
pub mod connector;
pub mod error;
pub mod metrics;
pub mod pricefeed;
pub mod signature;
pub mod stripe;
pub mod types;

pub use airtel::{AirtelConfig, AirtelConnector};
pub use checkout::{CheckoutConfig, CheckoutConnector};
pub use connector::{PaymentConnector, PayoutConnector};
pub use error::{Error, Result};
pub use stripe::{StripeConfig, StripeConnector};
pub use types::*;

/// Default request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Default webhook timestamp tolerance (seconds)
pub const DEFAULT_WEBHOOK_TOLERANCE_SECONDS: i64 = 300;
