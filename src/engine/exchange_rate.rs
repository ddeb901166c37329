//! Share/base conversion on a monotonically non-decreasing exchange rate.

use super::fees;
use super::interest::SECONDS_PER_YEAR;
use crate::domain::{Decimal, ExchangeRate};
use crate::error::{ensure_non_negative, LedgerError};
use serde::{Deserialize, Serialize};

/// Shortest window that is annualized by [`ExchangeRateModel::apy_from_rates`].
pub const DEFAULT_MIN_APY_WINDOW_SECONDS: i64 = 86_400;

/// Result of wrapping base asset into shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapOutcome {
    pub shares: Decimal,
    pub fee: Decimal,
}

/// Result of unwrapping shares into base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnwrapOutcome {
    pub base: Decimal,
    pub fee: Decimal,
}

/// Converts between shares and base asset and reports realised growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeRateModel {
    min_apy_window_seconds: i64,
}

impl ExchangeRateModel {
    pub fn new(min_apy_window_seconds: i64) -> Self {
        Self {
            min_apy_window_seconds: min_apy_window_seconds.max(0),
        }
    }

    pub fn min_apy_window_seconds(&self) -> i64 {
        self.min_apy_window_seconds
    }

    /// `shares * rate`.
    pub fn shares_to_base(&self, shares: Decimal, rate: ExchangeRate) -> Result<Decimal, LedgerError> {
        ensure_non_negative("shares", shares)?;
        shares
            .checked_mul(rate.to_decimal())
            .ok_or(LedgerError::ArithmeticOverflow("shares to base"))
    }

    /// `base / rate`.
    pub fn base_to_shares(&self, base: Decimal, rate: ExchangeRate) -> Result<Decimal, LedgerError> {
        ensure_non_negative("base", base)?;
        if rate.is_zero() {
            return Err(LedgerError::InvalidExchangeRate(
                "rate must be positive".to_string(),
            ));
        }
        base.checked_div(rate.to_decimal())
            .ok_or(LedgerError::ArithmeticOverflow("base to shares"))
    }

    /// Realised return between two rate samples, in percent.
    ///
    /// Windows shorter than the configured minimum report the raw period
    /// return; longer windows are annualized by straight-line scaling of
    /// elapsed time. Returns 0 when `elapsed_seconds <= 0`, when
    /// `rate_at_entry` is zero, or when the rate did not grow.
    pub fn apy_from_rates(
        &self,
        rate_at_entry: ExchangeRate,
        rate_now: ExchangeRate,
        elapsed_seconds: i64,
    ) -> Decimal {
        if elapsed_seconds <= 0 || rate_at_entry.is_zero() || rate_now <= rate_at_entry {
            return Decimal::zero();
        }

        let growth = rate_now.to_decimal() / rate_at_entry.to_decimal() - Decimal::one();
        let period_return = growth * Decimal::hundred();
        if elapsed_seconds < self.min_apy_window_seconds {
            return period_return;
        }

        period_return * Decimal::from_i64(SECONDS_PER_YEAR) / Decimal::from_i64(elapsed_seconds)
    }

    /// Yield on `shares` in base asset at the current rate:
    /// `shares * (rate_now - rate_at_entry) / rate_now`.
    ///
    /// A rate at or below the entry rate yields nothing.
    pub fn yield_earned(
        &self,
        shares: Decimal,
        rate_at_entry: ExchangeRate,
        rate_now: ExchangeRate,
    ) -> Result<Decimal, LedgerError> {
        ensure_non_negative("shares", shares)?;
        if rate_now <= rate_at_entry {
            return Ok(Decimal::zero());
        }

        let growth = Decimal::from_u64(rate_now.raw() - rate_at_entry.raw());
        shares
            .checked_mul(growth)
            .and_then(|v| v.checked_div(Decimal::from_u64(rate_now.raw())))
            .ok_or(LedgerError::ArithmeticOverflow("yield"))
    }

    /// Rate implied by vault balances: `(total_base + fees_accrued) / share_supply`.
    ///
    /// An empty vault trades 1:1.
    pub fn rate_from_balances(
        &self,
        total_base: Decimal,
        fees_accrued: Decimal,
        share_supply: Decimal,
    ) -> Result<ExchangeRate, LedgerError> {
        ensure_non_negative("total base", total_base)?;
        ensure_non_negative("fees accrued", fees_accrued)?;
        ensure_non_negative("share supply", share_supply)?;
        if share_supply.is_zero() {
            return Ok(ExchangeRate::ONE);
        }

        total_base
            .checked_add(fees_accrued)
            .and_then(|v| v.checked_div(share_supply))
            .and_then(ExchangeRate::from_decimal)
            .ok_or(LedgerError::ArithmeticOverflow("exchange rate"))
    }

    /// Wrap base into shares; the wrap fee is taken from the deposit first.
    pub fn wrap(&self, base: Decimal, rate: ExchangeRate) -> Result<WrapOutcome, LedgerError> {
        let fee = fees::wrap_fee(base)?;
        let shares = self.base_to_shares(base - fee, rate)?;
        Ok(WrapOutcome { shares, fee })
    }

    /// Unwrap shares into base; the unwrap fee is tiered on holding time.
    pub fn unwrap(
        &self,
        shares: Decimal,
        rate: ExchangeRate,
        held_seconds: i64,
    ) -> Result<UnwrapOutcome, LedgerError> {
        let gross = self.shares_to_base(shares, rate)?;
        let fee = fees::unwrap_fee(gross, held_seconds)?;
        Ok(UnwrapOutcome {
            base: gross - fee,
            fee,
        })
    }
}

impl Default for ExchangeRateModel {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_APY_WINDOW_SECONDS)
    }
}
