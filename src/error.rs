use crate::domain::{Decimal, PositionId};
use crate::facility::FacilityError;
use thiserror::Error;

/// Every failure the ledger and its calculators can report.
///
/// Validation variants are raised before any facility call; nothing is
/// ever committed when an error is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid amount for {field}: {value}")]
    InvalidAmount { field: &'static str, value: Decimal },
    #[error("Invalid leverage factor: {0}")]
    InvalidLeverageFactor(Decimal),
    #[error("Invalid rate: {0}")]
    InvalidRate(Decimal),
    #[error("Invalid exchange rate: {0}")]
    InvalidExchangeRate(String),
    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity {
        requested: Decimal,
        available: Decimal,
    },
    #[error("Position not found: {0}")]
    PositionNotFound(PositionId),
    #[error("Position already closed: {0}")]
    PositionAlreadyClosed(PositionId),
    #[error("Position {id} is not liquidatable at {ltv_bps} bps loan-to-value")]
    PositionNotLiquidatable { id: PositionId, ltv_bps: Decimal },
    #[error("Repayment failed: {0}")]
    RepaymentFailed(String),
    #[error("Arithmetic overflow computing {0}")]
    ArithmeticOverflow(&'static str),
    #[error("Close would leave a negative {0}")]
    NegativeBalance(&'static str),
}

impl LedgerError {
    /// True for caller-input mistakes detected before any external call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount { .. }
                | LedgerError::InvalidLeverageFactor(_)
                | LedgerError::InvalidRate(_)
                | LedgerError::InvalidExchangeRate(_)
        )
    }
}

impl From<FacilityError> for LedgerError {
    fn from(err: FacilityError) -> Self {
        match err {
            FacilityError::InsufficientLiquidity {
                requested,
                available,
            } => LedgerError::InsufficientLiquidity {
                requested,
                available,
            },
            FacilityError::RepaymentFailed(msg) => LedgerError::RepaymentFailed(msg),
            FacilityError::InvalidAmount(value) => LedgerError::InvalidAmount {
                field: "facility amount",
                value,
            },
        }
    }
}

/// Reject negative amounts; `field` names the offending input.
pub(crate) fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<(), LedgerError> {
    if value.is_negative() {
        return Err(LedgerError::InvalidAmount { field, value });
    }
    Ok(())
}

/// Reject zero and negative amounts.
pub(crate) fn ensure_positive(field: &'static str, value: Decimal) -> Result<(), LedgerError> {
    if !value.is_positive() {
        return Err(LedgerError::InvalidAmount { field, value });
    }
    Ok(())
}
