//! Payout destination validation
//!
//! Runs once at beneficiary creation and again immediately before any
//! payout attempt. A destination that fails validation must never reach a
//! provider call.

use crate::error::{Error, Result};
use crate::types::{MobileOperator, PayoutDetails, ReceivingMethod};
use once_cell::sync::Lazy;
use regex::Regex;

// Gabonese MSISDNs, local format
static AIRTEL_MSISDN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0(74|77)\d{6}$").unwrap());
static MOOV_MSISDN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0(62|65|66)\d{6}$").unwrap());
static ANY_MSISDN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^0\d{8}$").unwrap());

static ALIPAY_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9@._-]{5,64}$").unwrap());
static IBAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}\d{2}[A-Z0-9]{10,30}$").unwrap());

/// Check that `details` is a valid destination for `method`.
///
/// The variant must match the method (a phone number cannot fund an Alipay
/// payout) and the destination must match the operator's number plan.
pub fn validate_payout_details(method: ReceivingMethod, details: &PayoutDetails) -> Result<()> {
    match (method, details) {
        (
            ReceivingMethod::AirtelMoney,
            PayoutDetails::Phone {
                msisdn,
                operator: MobileOperator::Airtel,
            },
        ) => check(AIRTEL_MSISDN.is_match(msisdn), method, "not an Airtel number"),
        (
            ReceivingMethod::MoovMoney,
            PayoutDetails::Phone {
                msisdn,
                operator: MobileOperator::Moov,
            },
        ) => check(MOOV_MSISDN.is_match(msisdn), method, "not a Moov number"),
        (ReceivingMethod::Cash, PayoutDetails::Phone { msisdn, .. }) => {
            check(ANY_MSISDN.is_match(msisdn), method, "invalid contact number")
        }
        (ReceivingMethod::Alipay, PayoutDetails::Alipay { account_id }) => {
            check(ALIPAY_ID.is_match(account_id), method, "invalid Alipay id")
        }
        (ReceivingMethod::Wero, PayoutDetails::Wero { display_name }) => check(
            !display_name.trim().is_empty(),
            method,
            "empty Wero display name",
        ),
        (ReceivingMethod::BankTransfer, PayoutDetails::Bank { account_name, iban, .. }) => {
            check(
                !account_name.trim().is_empty() && IBAN.is_match(iban),
                method,
                "invalid account name or IBAN",
            )
        }
        _ => Err(Error::InvalidPayoutDetails {
            method: method.to_string(),
            reason: "payout details do not match the receiving method".to_string(),
        }),
    }
}

fn check(ok: bool, method: ReceivingMethod, reason: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidPayoutDetails {
            method: method.to_string(),
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airtel(msisdn: &str) -> PayoutDetails {
        PayoutDetails::Phone {
            msisdn: msisdn.to_string(),
            operator: MobileOperator::Airtel,
        }
    }

    #[test]
    fn test_airtel_number_plan() {
        assert!(validate_payout_details(ReceivingMethod::AirtelMoney, &airtel("074123456")).is_ok());
        assert!(validate_payout_details(ReceivingMethod::AirtelMoney, &airtel("077654321")).is_ok());

        // Moov prefix on an Airtel payout
        assert!(validate_payout_details(ReceivingMethod::AirtelMoney, &airtel("062123456")).is_err());
        // Too short
        assert!(validate_payout_details(ReceivingMethod::AirtelMoney, &airtel("07412345")).is_err());
        // International format not accepted
        assert!(
            validate_payout_details(ReceivingMethod::AirtelMoney, &airtel("+24174123456")).is_err()
        );
    }

    #[test]
    fn test_moov_number_plan() {
        let moov = PayoutDetails::Phone {
            msisdn: "065123456".to_string(),
            operator: MobileOperator::Moov,
        };
        assert!(validate_payout_details(ReceivingMethod::MoovMoney, &moov).is_ok());
    }

    #[test]
    fn test_operator_mismatch_is_rejected() {
        // Airtel-operated wallet offered for a Moov payout
        assert!(validate_payout_details(ReceivingMethod::MoovMoney, &airtel("074123456")).is_err());
    }

    #[test]
    fn test_variant_mismatch_is_rejected() {
        let alipay = PayoutDetails::Alipay {
            account_id: "user@example.com".to_string(),
        };
        let err = validate_payout_details(ReceivingMethod::AirtelMoney, &alipay).unwrap_err();
        assert!(matches!(err, Error::InvalidPayoutDetails { .. }));
    }

    #[test]
    fn test_alipay_id() {
        let ok = PayoutDetails::Alipay {
            account_id: "user@example.com".to_string(),
        };
        assert!(validate_payout_details(ReceivingMethod::Alipay, &ok).is_ok());

        let too_short = PayoutDetails::Alipay {
            account_id: "ab".to_string(),
        };
        assert!(validate_payout_details(ReceivingMethod::Alipay, &too_short).is_err());
    }

    #[test]
    fn test_bank_details() {
        let ok = PayoutDetails::Bank {
            account_name: "Jean Ondo".to_string(),
            iban: "GA2140001007003410510075".to_string(),
            bic: None,
        };
        assert!(validate_payout_details(ReceivingMethod::BankTransfer, &ok).is_ok());

        let bad = PayoutDetails::Bank {
            account_name: "Jean Ondo".to_string(),
            iban: "not-an-iban".to_string(),
            bic: None,
        };
        assert!(validate_payout_details(ReceivingMethod::BankTransfer, &bad).is_err());
    }

    #[test]
    fn test_cash_accepts_any_gabonese_number() {
        let contact = airtel("066987654");
        assert!(validate_payout_details(ReceivingMethod::Cash, &contact).is_ok());
    }
}
