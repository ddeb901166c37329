//! Fixed-point share exchange rate and basis-point rates.

use super::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed-point scale for exchange rates: 1.0 == 1_000_000.
pub const RATE_SCALE: u64 = 1_000_000;

/// Denominator for basis-point rates: 100% == 10_000.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Base asset per yield-bearing share, scaled by [`RATE_SCALE`].
///
/// Kept as an integer so that the rate a position was opened at is stored
/// bit-exact for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRate(pub u64);

impl ExchangeRate {
    /// The initial 1:1 rate.
    pub const ONE: ExchangeRate = ExchangeRate(RATE_SCALE);

    pub fn from_scaled(raw: u64) -> Self {
        ExchangeRate(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Exact decimal value (`raw / RATE_SCALE`).
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(rust_decimal::Decimal::from_i128_with_scale(self.0 as i128, 6))
    }

    /// Scale a decimal rate down to fixed point, rounding toward zero.
    ///
    /// Returns `None` for negative values or values beyond `u64`.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        if value.is_negative() {
            return None;
        }
        value
            .checked_mul(Decimal::from_u64(RATE_SCALE))
            .and_then(|scaled| scaled.to_u64())
            .map(ExchangeRate)
    }
}

impl std::fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

/// A rate expressed in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bps(pub u32);

impl Bps {
    /// Fraction of one, e.g. `Bps(200).to_decimal() == 0.02`.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from_scaled(self.0 as i64, 4)
    }

    /// `amount * rate`.
    pub fn apply(&self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.to_decimal())
    }
}
