//! Core types for KundaPay transfers
//!
//! All types are designed for:
//! - JSON serialization (serde)
//! - Exact arithmetic (Decimal for money)
//! - Closed enumerations at the product boundary (corridors, methods)

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// ISO 4217 currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Currency {
    /// Central African CFA Franc
    XAF,
    /// Euro
    EUR,
    /// Chinese Yuan
    CNY,
    /// US Dollar
    USD,
}

impl Currency {
    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::XAF => "XAF",
            Currency::EUR => "EUR",
            Currency::CNY => "CNY",
            Currency::USD => "USD",
        }
    }

    /// Parse from ISO code
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "XAF" => Some(Currency::XAF),
            "EUR" => Some(Currency::EUR),
            "CNY" => Some(Currency::CNY),
            "USD" => Some(Currency::USD),
            _ => None,
        }
    }

    /// ISO 4217 minor-unit exponent (XAF has no minor unit)
    pub fn minor_unit_exponent(&self) -> u32 {
        match self {
            Currency::XAF => 0,
            Currency::EUR | Currency::CNY | Currency::USD => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Transfer corridor: an ordered source/destination pair fixing the
/// currency pair and fee that apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Gabon → China (XAF → CNY)
    GabonToChina,
    /// France → Gabon (EUR → XAF)
    FranceToGabon,
    /// Gabon → France (XAF → EUR)
    GabonToFrance,
    /// USA → Gabon (USD → XAF)
    UsaToGabon,
    /// Gabon → USA (XAF → USD)
    GabonToUsa,
}

impl Direction {
    /// Currency the sender pays in
    pub fn source_currency(&self) -> Currency {
        match self {
            Direction::GabonToChina => Currency::XAF,
            Direction::FranceToGabon => Currency::EUR,
            Direction::GabonToFrance => Currency::XAF,
            Direction::UsaToGabon => Currency::USD,
            Direction::GabonToUsa => Currency::XAF,
        }
    }

    /// Currency the beneficiary receives in
    pub fn target_currency(&self) -> Currency {
        match self {
            Direction::GabonToChina => Currency::CNY,
            Direction::FranceToGabon => Currency::XAF,
            Direction::GabonToFrance => Currency::EUR,
            Direction::UsaToGabon => Currency::XAF,
            Direction::GabonToUsa => Currency::USD,
        }
    }

    /// Corridor code (e.g. `GABON_TO_CHINA`)
    pub fn code(&self) -> &'static str {
        match self {
            Direction::GabonToChina => "GABON_TO_CHINA",
            Direction::FranceToGabon => "FRANCE_TO_GABON",
            Direction::GabonToFrance => "GABON_TO_FRANCE",
            Direction::UsaToGabon => "USA_TO_GABON",
            Direction::GabonToUsa => "GABON_TO_USA",
        }
    }

    /// Parse from corridor code
    pub fn from_code(s: &str) -> Option<Self> {
        match s {
            "GABON_TO_CHINA" => Some(Direction::GabonToChina),
            "FRANCE_TO_GABON" => Some(Direction::FranceToGabon),
            "GABON_TO_FRANCE" => Some(Direction::GabonToFrance),
            "USA_TO_GABON" => Some(Direction::UsaToGabon),
            "GABON_TO_USA" => Some(Direction::GabonToUsa),
            _ => None,
        }
    }

    /// All supported corridors
    pub fn all() -> &'static [Direction] {
        &[
            Direction::GabonToChina,
            Direction::FranceToGabon,
            Direction::GabonToFrance,
            Direction::UsaToGabon,
            Direction::GabonToUsa,
        ]
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// How the sender funds the transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Airtel Money wallet debit
    AirtelMoney,
    /// Moov Money wallet debit
    MoovMoney,
    /// Card payment (Stripe / Checkout.com)
    Card,
    /// SEPA / wire transfer
    BankTransfer,
    /// Wero instant payment
    Wero,
}

/// How the beneficiary receives the funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReceivingMethod {
    /// Airtel Money wallet credit
    AirtelMoney,
    /// Moov Money wallet credit
    MoovMoney,
    /// Alipay account credit
    Alipay,
    /// Bank account credit
    BankTransfer,
    /// Wero instant payment
    Wero,
    /// Cash pickup
    Cash,
}

impl fmt::Display for ReceivingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReceivingMethod::AirtelMoney => "airtel_money",
            ReceivingMethod::MoovMoney => "moov_money",
            ReceivingMethod::Alipay => "alipay",
            ReceivingMethod::BankTransfer => "bank_transfer",
            ReceivingMethod::Wero => "wero",
            ReceivingMethod::Cash => "cash",
        };
        write!(f, "{}", s)
    }
}

/// Transfer lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Submitted, awaiting payment
    Pending,
    /// Payment confirmed by provider webhook
    Paid,
    /// Funds delivered to the beneficiary (final)
    Completed,
    /// Payout failed (final)
    Failed,
    /// Cancelled by an operator (final)
    Cancelled,
}

impl TransferStatus {
    /// True once no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferStatus::Completed | TransferStatus::Failed | TransferStatus::Cancelled
        )
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Paid => "paid",
            TransferStatus::Completed => "completed",
            TransferStatus::Failed => "failed",
            TransferStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Ephemeral pricing result
///
/// Re-derived on every user interaction, never persisted and never cached.
/// `amount_received` is always derived from `amount_sent` by the calculator;
/// the two are never set independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferQuote {
    /// Corridor
    pub direction: Direction,

    /// Amount the sender pays, in `sender_currency`
    pub amount_sent: Decimal,

    /// Amount the beneficiary receives, in `receiver_currency`
    pub amount_received: Decimal,

    /// Total fees (KundaPay + withdrawal), in `sender_currency`
    pub fees: Decimal,

    /// KundaPay's fee component
    pub kundapay_fees: Decimal,

    /// Mobile-money cash-out fee component
    pub withdrawal_fees: Decimal,

    /// Sender-side currency
    pub sender_currency: Currency,

    /// Receiver-side currency
    pub receiver_currency: Currency,

    /// Exchange rate applied (source → target)
    pub exchange_rate: Decimal,

    /// Funding method
    pub payment_method: PaymentMethod,

    /// Delivery method
    pub receiving_method: ReceivingMethod,
}

/// Persistent transfer record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Primary key
    pub id: Uuid,

    /// Unique human-readable correlation code (`KP-XXXXXXXXXXXX-CC`).
    /// Providers echo this back in webhooks; it is the only lookup key
    /// available to webhook handlers.
    pub reference: String,

    /// Owning user (sender)
    pub user_id: Uuid,

    /// Corridor
    pub direction: Direction,

    /// Amount charged to the sender
    pub amount_sent: Decimal,

    /// Amount delivered to the beneficiary
    pub amount_received: Decimal,

    /// Total fees
    pub fees: Decimal,

    /// KundaPay fee component
    pub kundapay_fees: Decimal,

    /// Cash-out fee component
    pub withdrawal_fees: Decimal,

    /// Sender-side currency
    pub sender_currency: Currency,

    /// Receiver-side currency
    pub receiver_currency: Currency,

    /// Funding method
    pub payment_method: PaymentMethod,

    /// Delivery method
    pub receiving_method: ReceivingMethod,

    /// Declared origin of funds
    pub funds_origin: Option<String>,

    /// Declared reason for the transfer
    pub transfer_reason: Option<String>,

    /// Lifecycle status
    pub status: TransferStatus,

    /// Provider-side payment id, set on payment confirmation
    pub payment_id: Option<String>,

    /// Submission timestamp
    pub created_at: DateTime<Utc>,

    /// Payment confirmation timestamp
    pub paid_at: Option<DateTime<Utc>>,

    /// Completion/validation timestamp
    pub validated_at: Option<DateTime<Utc>>,
}

/// Method-specific payout destination
///
/// Tagged union validated once at beneficiary creation; downstream code
/// matches on the variant instead of probing an untyped blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayoutDetails {
    /// Mobile-money wallet (Airtel / Moov) or cash-pickup contact
    Phone {
        /// Local-format MSISDN (e.g. `074123456`)
        msisdn: String,
        /// Wallet operator
        operator: MobileOperator,
    },
    /// Alipay account
    Alipay {
        /// Alipay login id (email or phone)
        account_id: String,
    },
    /// Wero recipient
    Wero {
        /// Name registered with Wero
        display_name: String,
    },
    /// Bank account
    Bank {
        /// Account holder name
        account_name: String,
        /// IBAN
        iban: String,
        /// BIC, when required by the receiving bank
        bic: Option<String>,
    },
}

/// Mobile-money operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobileOperator {
    /// Airtel Gabon
    Airtel,
    /// Moov Gabon
    Moov,
}

/// Transfer beneficiary
///
/// Created once at transfer submission, immutable thereafter. Owned
/// exclusively by its transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Primary key
    pub id: Uuid,

    /// Owning transfer
    pub transfer_id: Uuid,

    /// Recipient first name
    pub first_name: String,

    /// Recipient last name
    pub last_name: String,

    /// Recipient email, when known
    pub email: Option<String>,

    /// Method-specific payout destination
    pub payout_details: PayoutDetails,
}

/// Notification category, one per lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Payment confirmed (pending → paid)
    PaymentReceived,
    /// Funds delivered (→ completed)
    TransferCompleted,
    /// Payout failed (→ failed)
    TransferFailed,
}

/// Notification delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Not yet seen
    Unread,
    /// Seen by the recipient
    Read,
}

/// User-facing notification record
///
/// Append-only side channel: created on transfer state transitions, never
/// updates a transfer, and creation failure never rolls back the parent
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Primary key
    pub id: Uuid,

    /// Category
    pub kind: NotificationKind,

    /// Transfer this notification is about
    pub transfer_id: Uuid,

    /// Recipient user; `None` means admin broadcast
    pub recipient_id: Option<Uuid>,

    /// Human-readable message
    pub message: String,

    /// Delivery status
    pub status: NotificationStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_currency_mapping() {
        assert_eq!(Direction::GabonToChina.source_currency(), Currency::XAF);
        assert_eq!(Direction::GabonToChina.target_currency(), Currency::CNY);
        assert_eq!(Direction::FranceToGabon.source_currency(), Currency::EUR);
        assert_eq!(Direction::FranceToGabon.target_currency(), Currency::XAF);
    }

    #[test]
    fn test_direction_code_round_trip() {
        for dir in Direction::all() {
            assert_eq!(Direction::from_code(dir.code()), Some(*dir));
        }
        assert_eq!(Direction::from_code("MARS_TO_VENUS"), None);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TransferStatus::Pending.is_terminal());
        assert!(!TransferStatus::Paid.is_terminal());
        assert!(TransferStatus::Completed.is_terminal());
        assert!(TransferStatus::Failed.is_terminal());
        assert!(TransferStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_xaf_has_no_minor_unit() {
        assert_eq!(Currency::XAF.minor_unit_exponent(), 0);
        assert_eq!(Currency::EUR.minor_unit_exponent(), 2);
    }

    #[test]
    fn test_payout_details_serde_tag() {
        let details = PayoutDetails::Phone {
            msisdn: "074123456".to_string(),
            operator: MobileOperator::Airtel,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["kind"], "phone");
        assert_eq!(json["operator"], "airtel");

        let back: PayoutDetails = serde_json::from_value(json).unwrap();
        assert_eq!(back, details);
    }
}
