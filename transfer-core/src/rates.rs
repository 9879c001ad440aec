//! Exchange-rate and fee tables
//!
//! Both tables are plain injected data: the calculator receives them at
//! construction time and nothing in this crate reads globals or the
//! network. Rate sourcing (admin edits, market feeds) happens upstream.

use crate::error::{Error, Result};
use crate::types::{Currency, Direction, ReceivingMethod};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exchange-rate table holding one canonical rate per unordered currency
/// pair
///
/// The reversed direction is derived as the exact reciprocal, so
/// `rate(A,B) * rate(B,A) == 1` holds by construction rather than by
/// table discipline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    rates: HashMap<(Currency, Currency), Decimal>,
}

impl RateTable {
    /// Build from `(base, quote, rate)` triples, where `rate` is the price
    /// of one `base` unit in `quote` units. The reversed pair must not be
    /// declared separately.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Currency, Currency, Decimal)>) -> Self {
        let mut rates = HashMap::new();
        for (base, quote, rate) in pairs {
            // Last declaration wins; the reversed key is never stored.
            rates.remove(&(quote, base));
            rates.insert((base, quote), rate);
        }
        Self { rates }
    }

    /// Reference rates for the supported corridors
    pub fn reference() -> Self {
        Self::from_pairs([
            // CFA franc peg
            (Currency::EUR, Currency::XAF, Decimal::new(655_957, 3)),
            (Currency::XAF, Currency::CNY, Decimal::new(11_445, 6)),
            (Currency::USD, Currency::XAF, Decimal::new(610_000, 3)),
        ])
    }

    /// Rate converting one `from` unit into `to` units
    pub fn rate_of(&self, from: Currency, to: Currency) -> Result<Decimal> {
        if let Some(rate) = self.rates.get(&(from, to)) {
            return Ok(*rate);
        }
        if let Some(rate) = self.rates.get(&(to, from)) {
            return Ok(Decimal::ONE / *rate);
        }
        Err(Error::UnknownPair {
            from: from.code(),
            to: to.code(),
        })
    }

    /// All canonical pairs in the table
    pub fn pairs(&self) -> impl Iterator<Item = (Currency, Currency)> + '_ {
        self.rates.keys().copied()
    }
}

/// Per-corridor fee fractions plus per-method cash-out fees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    corridor_fees: HashMap<Direction, Decimal>,
    withdrawal_fees: HashMap<ReceivingMethod, Decimal>,
}

impl FeeSchedule {
    /// Build from explicit corridor and withdrawal tables
    pub fn new(
        corridor_fees: HashMap<Direction, Decimal>,
        withdrawal_fees: HashMap<ReceivingMethod, Decimal>,
    ) -> Self {
        Self {
            corridor_fees,
            withdrawal_fees,
        }
    }

    /// Reference fees for the supported corridors
    pub fn reference() -> Self {
        let corridor_fees = HashMap::from([
            (Direction::GabonToChina, Decimal::new(85, 3)),  // 8.5%
            (Direction::FranceToGabon, Decimal::new(20, 3)), // 2%
            (Direction::GabonToFrance, Decimal::new(50, 3)), // 5%
            (Direction::UsaToGabon, Decimal::new(20, 3)),    // 2%
            (Direction::GabonToUsa, Decimal::new(55, 3)),    // 5.5%
        ]);
        let withdrawal_fees = HashMap::from([
            (ReceivingMethod::AirtelMoney, Decimal::new(30, 3)), // 3%
            (ReceivingMethod::MoovMoney, Decimal::new(30, 3)),   // 3%
        ]);
        Self::new(corridor_fees, withdrawal_fees)
    }

    /// Fee fraction for a corridor
    pub fn fee_of(&self, direction: Direction) -> Result<Decimal> {
        self.corridor_fees
            .get(&direction)
            .copied()
            .ok_or_else(|| Error::UnsupportedDirection(direction.code().to_string()))
    }

    /// Cash-out fee fraction for a receiving method (zero when the method
    /// has no cash-out cost)
    pub fn withdrawal_fee_of(&self, method: ReceivingMethod) -> Decimal {
        self.withdrawal_fees
            .get(&method)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_canonical_rate_lookup() {
        let table = RateTable::reference();
        assert_eq!(
            table.rate_of(Currency::EUR, Currency::XAF).unwrap(),
            dec!(655.957)
        );
        assert_eq!(
            table.rate_of(Currency::XAF, Currency::CNY).unwrap(),
            dec!(0.011445)
        );
    }

    #[test]
    fn test_inverse_is_reciprocal() {
        let table = RateTable::reference();
        let forward = table.rate_of(Currency::EUR, Currency::XAF).unwrap();
        let inverse = table.rate_of(Currency::XAF, Currency::EUR).unwrap();

        let product = forward * inverse;
        let tolerance = dec!(0.000001);
        assert!((product - Decimal::ONE).abs() < tolerance, "{}", product);
    }

    #[test]
    fn test_unknown_pair() {
        let table = RateTable::reference();
        let err = table.rate_of(Currency::CNY, Currency::USD).unwrap_err();
        assert!(matches!(err, Error::UnknownPair { .. }));
    }

    #[test]
    fn test_reversed_declaration_does_not_duplicate() {
        let table = RateTable::from_pairs([
            (Currency::EUR, Currency::XAF, dec!(655.957)),
            // Same unordered pair declared again, reversed
            (Currency::XAF, Currency::EUR, dec!(0.0015245)),
        ]);
        assert_eq!(table.pairs().count(), 1);
    }

    #[test]
    fn test_fee_lookup() {
        let fees = FeeSchedule::reference();
        assert_eq!(fees.fee_of(Direction::GabonToChina).unwrap(), dec!(0.085));
        assert_eq!(
            fees.withdrawal_fee_of(ReceivingMethod::AirtelMoney),
            dec!(0.03)
        );
        assert_eq!(
            fees.withdrawal_fee_of(ReceivingMethod::Alipay),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_unsupported_direction() {
        let fees = FeeSchedule::new(HashMap::new(), HashMap::new());
        let err = fees.fee_of(Direction::GabonToChina).unwrap_err();
        assert!(matches!(err, Error::UnsupportedDirection(_)));
    }
}
