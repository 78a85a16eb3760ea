//! Amount types for the NFT exchange
//!
//! Native currency is tracked in integer micro-units. Asset holdings carry an
//! explicit "not opted in" state so that an account without a holding slot is
//! never confused with one that holds zero units.

use super::error::ExchangeError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Micro-units per whole unit of native currency
pub const MICRO_PER_UNIT: u64 = 1_000_000;

/// Ticker printed after formatted native amounts
pub const CURRENCY_SYMBOL: &str = "ALGO";

/// Decimal places shown when formatting native amounts
const DISPLAY_DECIMALS: u32 = 4;

/// Native currency amount in micro-units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MicroAlgos(pub u64);

impl MicroAlgos {
    pub const ZERO: MicroAlgos = MicroAlgos(0);

    /// Convert a whole-unit amount (e.g. `10` or `0.5`) to micro-units
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::InvalidAmount` if the amount is negative, has
    /// more precision than a micro-unit, or does not fit in a `u64`.
    pub fn from_units(units: Decimal) -> Result<Self, ExchangeError> {
        let invalid = || ExchangeError::invalid_amount(&units.to_string());

        if units.is_sign_negative() {
            return Err(invalid());
        }

        let micro = units
            .checked_mul(Decimal::from(MICRO_PER_UNIT))
            .ok_or_else(invalid)?;
        if !micro.fract().is_zero() {
            return Err(invalid());
        }

        micro.to_u64().map(MicroAlgos).ok_or_else(invalid)
    }

    /// Whole-unit value as a decimal with micro-unit precision
    pub fn to_units(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(MICRO_PER_UNIT)
    }

    /// Whole units truncated to the four decimals shown to users
    pub fn display_units(self) -> Decimal {
        self.to_units()
            .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::ToZero)
    }

    pub fn checked_add(self, other: MicroAlgos) -> Option<MicroAlgos> {
        self.0.checked_add(other.0).map(MicroAlgos)
    }

    pub fn checked_sub(self, other: MicroAlgos) -> Option<MicroAlgos> {
        self.0.checked_sub(other.0).map(MicroAlgos)
    }
}

impl fmt::Display for MicroAlgos {
    /// Formats as whole units truncated to four decimals, e.g. `9.9980 ALGO`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} {}", self.display_units(), CURRENCY_SYMBOL)
    }
}

/// Asset balance as reported by the ledger for one account
///
/// `NotOptedIn` is an expected terminal state, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetBalance {
    /// The account has no holding slot for the asset
    NotOptedIn,

    /// The account holds this many units (possibly zero)
    Held(u64),
}

impl AssetBalance {
    /// Units held, or `None` when not opted in
    pub fn units(&self) -> Option<u64> {
        match self {
            AssetBalance::NotOptedIn => None,
            AssetBalance::Held(units) => Some(*units),
        }
    }

    pub fn is_opted_in(&self) -> bool {
        matches!(self, AssetBalance::Held(_))
    }
}

impl fmt::Display for AssetBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetBalance::NotOptedIn => write!(f, "NULL"),
            AssetBalance::Held(units) => write!(f, "{}", units),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case::whole("10", 10_000_000)]
    #[case::fraction("0.5", 500_000)]
    #[case::micro("0.000001", 1)]
    #[case::zero("0", 0)]
    fn test_from_units_valid(#[case] input: &str, #[case] expected: u64) {
        let units = Decimal::from_str(input).unwrap();
        assert_eq!(MicroAlgos::from_units(units).unwrap(), MicroAlgos(expected));
    }

    #[rstest]
    #[case::negative("-1")]
    #[case::sub_micro("0.0000001")]
    fn test_from_units_invalid(#[case] input: &str) {
        let units = Decimal::from_str(input).unwrap();
        let result = MicroAlgos::from_units(units);
        assert!(matches!(result, Err(ExchangeError::InvalidAmount { .. })));
    }

    #[rstest]
    #[case::starting_balance(MicroAlgos(10_000_000), "10.0000 ALGO")]
    #[case::after_fees(MicroAlgos(9_997_000), "9.9970 ALGO")]
    #[case::truncates(MicroAlgos(1_999_999), "1.9999 ALGO")]
    #[case::zero(MicroAlgos::ZERO, "0.0000 ALGO")]
    fn test_display(#[case] amount: MicroAlgos, #[case] expected: &str) {
        assert_eq!(amount.to_string(), expected);
    }

    #[test]
    fn test_asset_balance_distinguishes_zero_from_not_opted_in() {
        assert_ne!(AssetBalance::NotOptedIn, AssetBalance::Held(0));
        assert_eq!(AssetBalance::NotOptedIn.units(), None);
        assert_eq!(AssetBalance::Held(0).units(), Some(0));
        assert_eq!(AssetBalance::NotOptedIn.to_string(), "NULL");
        assert_eq!(AssetBalance::Held(1).to_string(), "1");
    }
}
