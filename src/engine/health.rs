//! Collateral-to-debt safety ratio and risk tiers.

use crate::domain::{Decimal, BPS_DENOMINATOR};
use crate::error::{ensure_positive, LedgerError};
use serde::{Deserialize, Serialize};

/// Reported when nothing is borrowed.
pub const INFINITE_HEALTH_FACTOR: i64 = 999;

/// Loan-to-value at or above which a position may be liquidated (90%).
pub const LIQUIDATION_THRESHOLD_BPS: u32 = 9_000;

/// Risk classification shared by every consumer of a health factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskTier {
    /// factor >= 2.0
    Safe,
    /// 1.5 <= factor < 2.0
    Caution,
    /// 1.0 <= factor < 1.5
    Warning,
    /// factor < 1.0
    AtRisk,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Safe => write!(f, "safe"),
            RiskTier::Caution => write!(f, "caution"),
            RiskTier::Warning => write!(f, "warning"),
            RiskTier::AtRisk => write!(f, "at-risk"),
        }
    }
}

/// Snapshot of a position's health at a given price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub factor: Decimal,
    pub tier: RiskTier,
    pub ltv_bps: Decimal,
    pub collateral_value: Decimal,
    pub debt_value: Decimal,
    pub liquidatable: bool,
}

/// Health factor calculator with a fixed liquidation penalty multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthFactor {
    liquidation_penalty_multiplier: Decimal,
}

impl HealthFactor {
    /// # Errors
    /// `InvalidAmount` if the multiplier is not strictly positive.
    pub fn new(liquidation_penalty_multiplier: Decimal) -> Result<Self, LedgerError> {
        ensure_positive("liquidation penalty multiplier", liquidation_penalty_multiplier)?;
        Ok(Self {
            liquidation_penalty_multiplier,
        })
    }

    pub fn liquidation_penalty_multiplier(&self) -> Decimal {
        self.liquidation_penalty_multiplier
    }

    /// `collateral_value / (borrowed_value * multiplier)`, or the
    /// [`INFINITE_HEALTH_FACTOR`] sentinel when nothing is borrowed.
    ///
    /// # Errors
    /// `InvalidAmount` for negative debt, `ArithmeticOverflow` when the
    /// penalised debt or the ratio is not representable.
    pub fn compute(&self, collateral_value: Decimal, borrowed_value: Decimal) -> Result<Decimal, LedgerError> {
        compute_with_penalty(
            collateral_value,
            borrowed_value,
            self.liquidation_penalty_multiplier,
        )
    }

    /// Full report for a collateral/debt pair.
    pub fn report(&self, collateral_value: Decimal, debt_value: Decimal) -> Result<HealthReport, LedgerError> {
        let factor = self.compute(collateral_value, debt_value)?;
        let ltv_bps = ltv_bps(debt_value, collateral_value)?;
        Ok(HealthReport {
            factor,
            tier: classify(factor),
            ltv_bps,
            collateral_value,
            debt_value,
            liquidatable: is_liquidatable(ltv_bps),
        })
    }
}

impl Default for HealthFactor {
    fn default() -> Self {
        Self {
            liquidation_penalty_multiplier: Decimal::one(),
        }
    }
}

/// Health factor with an explicit penalty multiplier.
pub fn compute_with_penalty(
    collateral_value: Decimal,
    borrowed_value: Decimal,
    liquidation_penalty_multiplier: Decimal,
) -> Result<Decimal, LedgerError> {
    if borrowed_value.is_negative() {
        return Err(LedgerError::InvalidAmount {
            field: "borrowed value",
            value: borrowed_value,
        });
    }
    if borrowed_value.is_zero() {
        return Ok(Decimal::from_i64(INFINITE_HEALTH_FACTOR));
    }
    borrowed_value
        .checked_mul(liquidation_penalty_multiplier)
        .and_then(|debt| collateral_value.checked_div(debt))
        .ok_or(LedgerError::ArithmeticOverflow("health factor"))
}

pub fn classify(factor: Decimal) -> RiskTier {
    if factor >= Decimal::from_i64(2) {
        RiskTier::Safe
    } else if factor >= Decimal::from_scaled(15, 1) {
        RiskTier::Caution
    } else if factor >= Decimal::one() {
        RiskTier::Warning
    } else {
        RiskTier::AtRisk
    }
}

/// Loan-to-value in basis points, rounded down.
///
/// # Errors
/// `InvalidAmount` when the collateral value is not positive or the debt is negative.
pub fn ltv_bps(borrowed_value: Decimal, collateral_value: Decimal) -> Result<Decimal, LedgerError> {
    ensure_positive("collateral value", collateral_value)?;
    if borrowed_value.is_negative() {
        return Err(LedgerError::InvalidAmount {
            field: "borrowed value",
            value: borrowed_value,
        });
    }
    borrowed_value
        .checked_mul(Decimal::from_i64(BPS_DENOMINATOR as i64))
        .and_then(|v| v.checked_div(collateral_value))
        .map(|v| v.floor())
        .ok_or(LedgerError::ArithmeticOverflow("loan-to-value"))
}

pub fn is_liquidatable(ltv_bps: Decimal) -> bool {
    ltv_bps >= Decimal::from_i64(LIQUIDATION_THRESHOLD_BPS as i64)
}
