//! Transfer pricing calculator
//!
//! Pure function of the injected rate and fee tables. Forward mode prices
//! from the sent amount, reverse mode from the desired received amount.
//!
//! Rounding policy (XAF only, other currencies keep full precision):
//! - sent XAF amounts round **up** to the next multiple of 5
//! - received XAF amounts round **down** to the nearest multiple of 5
//! - fees are recomputed from the rounded sent amount, so the displayed
//!   fee always matches what the sender is actually charged

use crate::error::{Error, Result};
use crate::rates::{FeeSchedule, RateTable};
use crate::types::{Currency, Direction, PaymentMethod, ReceivingMethod, TransferQuote};
use rust_decimal::Decimal;

/// Transfer pricing calculator
#[derive(Debug, Clone)]
pub struct TransferCalculator {
    rates: RateTable,
    fees: FeeSchedule,
}

impl TransferCalculator {
    /// Create a calculator over injected tables
    pub fn new(rates: RateTable, fees: FeeSchedule) -> Self {
        Self { rates, fees }
    }

    /// Calculator over the reference tables
    pub fn reference() -> Self {
        Self::new(RateTable::reference(), FeeSchedule::reference())
    }

    /// Compute a quote.
    ///
    /// `amount` is the sent amount in forward mode
    /// (`is_receive_amount == false`) or the desired received amount in
    /// reverse mode. Deterministic and side-effect free.
    pub fn calculate(
        &self,
        amount: Decimal,
        direction: Direction,
        payment_method: PaymentMethod,
        receiving_method: ReceivingMethod,
        is_receive_amount: bool,
    ) -> Result<TransferQuote> {
        if amount <= Decimal::ZERO {
            return Err(Error::NonPositiveAmount(amount));
        }

        let sender_currency = direction.source_currency();
        let receiver_currency = direction.target_currency();
        let rate = self.rates.rate_of(sender_currency, receiver_currency)?;
        let kundapay_pct = self.fees.fee_of(direction)?;
        let withdrawal_pct = self.fees.withdrawal_fee_of(receiving_method);
        let total_pct = kundapay_pct + withdrawal_pct;
        let net_factor = Decimal::ONE - total_pct;

        let (amount_sent, amount_received) = if is_receive_amount {
            // Reverse: derive the sent amount algebraically, then round it
            // by the same sent-side rule so the quoted charge is always
            // collectable. The receiver side keeps the requested amount.
            let received = round_received(amount, receiver_currency);
            let sent = round_sent(received / (rate * net_factor), sender_currency);
            (sent, received)
        } else {
            let sent = round_sent(amount, sender_currency);
            let received = round_received(sent * net_factor * rate, receiver_currency);
            (sent, received)
        };

        // Fees follow the rounded sent amount, not the pre-rounding one.
        let kundapay_fees = amount_sent * kundapay_pct;
        let withdrawal_fees = amount_sent * withdrawal_pct;

        Ok(TransferQuote {
            direction,
            amount_sent,
            amount_received,
            fees: kundapay_fees + withdrawal_fees,
            kundapay_fees,
            withdrawal_fees,
            sender_currency,
            receiver_currency,
            exchange_rate: rate,
            payment_method,
            receiving_method,
        })
    }
}

const FIVE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Sent XAF amounts round up to the next multiple of 5
fn round_sent(amount: Decimal, currency: Currency) -> Decimal {
    match currency {
        Currency::XAF => (amount / FIVE).ceil() * FIVE,
        _ => amount,
    }
}

/// Received XAF amounts round down to the nearest multiple of 5
fn round_received(amount: Decimal, currency: Currency) -> Decimal {
    match currency {
        Currency::XAF => (amount / FIVE).floor() * FIVE,
        _ => amount,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn calc() -> TransferCalculator {
        TransferCalculator::reference()
    }

    #[test]
    fn test_gabon_to_china_forward() {
        // 100 000 XAF at 8.5% fee, rate 0.011445, Alipay delivery
        let quote = calc()
            .calculate(
                dec!(100000),
                Direction::GabonToChina,
                PaymentMethod::AirtelMoney,
                ReceivingMethod::Alipay,
                false,
            )
            .unwrap();

        // 100 000 is already a multiple of 5
        assert_eq!(quote.amount_sent, dec!(100000));
        assert_eq!(quote.kundapay_fees, dec!(8500));
        assert_eq!(quote.withdrawal_fees, dec!(0));
        assert_eq!(quote.fees, dec!(8500));
        // No rounding on the CNY side: exact product
        assert_eq!(quote.amount_received, dec!(100000) * dec!(0.915) * dec!(0.011445));
        assert_eq!(quote.sender_currency, Currency::XAF);
        assert_eq!(quote.receiver_currency, Currency::CNY);
    }

    #[test]
    fn test_france_to_gabon_rounds_received_down_to_5() {
        let quote = calc()
            .calculate(
                dec!(100),
                Direction::FranceToGabon,
                PaymentMethod::Card,
                ReceivingMethod::Cash,
                false,
            )
            .unwrap();

        // EUR sent side untouched
        assert_eq!(quote.amount_sent, dec!(100));

        // Raw product: 100 * 0.98 * 655.957 = 64283.786
        let raw = dec!(100) * dec!(0.98) * dec!(655.957);
        assert_eq!(quote.amount_received, dec!(64280));
        assert!(quote.amount_received <= raw);
        assert_eq!(quote.amount_received % dec!(5), dec!(0));
    }

    #[test]
    fn test_xaf_sent_rounds_up_to_5() {
        let quote = calc()
            .calculate(
                dec!(100001),
                Direction::GabonToChina,
                PaymentMethod::AirtelMoney,
                ReceivingMethod::Alipay,
                false,
            )
            .unwrap();

        assert_eq!(quote.amount_sent, dec!(100005));
        // Fee recomputed from the rounded amount
        assert_eq!(quote.kundapay_fees, dec!(100005) * dec!(0.085));
    }

    #[test]
    fn test_reverse_mode_rounds_derived_xaf_sent_up() {
        // Want the beneficiary to receive exactly 1000 CNY
        let quote = calc()
            .calculate(
                dec!(1000),
                Direction::GabonToChina,
                PaymentMethod::AirtelMoney,
                ReceivingMethod::Alipay,
                true,
            )
            .unwrap();

        assert_eq!(quote.amount_received, dec!(1000));
        // Sent is a multiple of 5 and covers the requested amount
        assert_eq!(quote.amount_sent % dec!(5), dec!(0));
        let replayed = quote.amount_sent * dec!(0.915) * dec!(0.011445);
        assert!(replayed >= dec!(1000));
        // Rounding up never over-charges by a full denomination
        let exact = dec!(1000) / (dec!(0.011445) * dec!(0.915));
        assert!(quote.amount_sent - exact < dec!(5));
    }

    #[test]
    fn test_reverse_mode_eur_sent_not_rounded() {
        // France → Gabon reverse: 64280 XAF wanted, EUR side exact
        let quote = calc()
            .calculate(
                dec!(64280),
                Direction::FranceToGabon,
                PaymentMethod::Card,
                ReceivingMethod::Cash,
                true,
            )
            .unwrap();

        assert_eq!(quote.amount_received, dec!(64280));
        let exact = dec!(64280) / (dec!(655.957) * dec!(0.98));
        assert_eq!(quote.amount_sent, exact);
    }

    #[test]
    fn test_withdrawal_fee_included_for_mobile_money() {
        let quote = calc()
            .calculate(
                dec!(100),
                Direction::FranceToGabon,
                PaymentMethod::Card,
                ReceivingMethod::AirtelMoney,
                false,
            )
            .unwrap();

        // 2% corridor + 3% cash-out
        assert_eq!(quote.kundapay_fees, dec!(2));
        assert_eq!(quote.withdrawal_fees, dec!(3));
        assert_eq!(quote.fees, dec!(5));
        let raw = dec!(100) * dec!(0.95) * dec!(655.957);
        assert!(quote.amount_received <= raw);
    }

    #[test]
    fn test_rejects_non_positive_amounts() {
        for bad in [dec!(0), dec!(-1)] {
            let err = calc()
                .calculate(
                    bad,
                    Direction::GabonToChina,
                    PaymentMethod::Card,
                    ReceivingMethod::Alipay,
                    false,
                )
                .unwrap_err();
            assert!(matches!(err, Error::NonPositiveAmount(_)));
        }
    }

    #[test]
    fn test_missing_corridor_fee_is_unsupported_direction() {
        let calc = TransferCalculator::new(
            RateTable::reference(),
            FeeSchedule::new(Default::default(), Default::default()),
        );
        let err = calc
            .calculate(
                dec!(100),
                Direction::GabonToChina,
                PaymentMethod::Card,
                ReceivingMethod::Alipay,
                false,
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedDirection(_)));
    }
}
