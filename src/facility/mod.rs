//! Lending facility abstraction: where borrowed quote comes from and goes back to.

use crate::domain::Decimal;
use thiserror::Error;

pub mod pool;

pub use pool::LendingPool;

/// Capability the ledger borrows from and repays to.
///
/// Calls are synchronous; an asynchronous embedding must resolve the
/// underlying request before returning.
pub trait LendingFacility {
    /// Draw `amount` of quote from the facility.
    ///
    /// # Errors
    /// `InsufficientLiquidity` if the facility cannot lend `amount`.
    fn borrow(&mut self, amount: Decimal) -> Result<(), FacilityError>;

    /// Return `amount` of quote (principal plus interest).
    ///
    /// # Errors
    /// `RepaymentFailed` if the facility rejects the repayment.
    fn repay(&mut self, amount: Decimal) -> Result<(), FacilityError>;

    /// Quote currently available to borrow.
    fn available_liquidity(&self) -> Decimal;

    /// Annual borrow rate in percent (10 == 10% APY).
    fn current_borrow_rate_percent(&self) -> Decimal;
}

/// Error type for lending facility operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacilityError {
    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity {
        requested: Decimal,
        available: Decimal,
    },
    #[error("Repayment failed: {0}")]
    RepaymentFailed(String),
    #[error("Invalid facility amount: {0}")]
    InvalidAmount(Decimal),
}

impl<T: LendingFacility + ?Sized> LendingFacility for Box<T> {
    fn borrow(&mut self, amount: Decimal) -> Result<(), FacilityError> {
        (**self).borrow(amount)
    }

    fn repay(&mut self, amount: Decimal) -> Result<(), FacilityError> {
        (**self).repay(amount)
    }

    fn available_liquidity(&self) -> Decimal {
        (**self).available_liquidity()
    }

    fn current_borrow_rate_percent(&self) -> Decimal {
        (**self).current_borrow_rate_percent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_error_display() {
        let err = FacilityError::InsufficientLiquidity {
            requested: Decimal::from_i64(1500),
            available: Decimal::from_i64(1000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient liquidity: requested 1500, available 1000"
        );

        let err = FacilityError::RepaymentFailed("no outstanding debt".to_string());
        assert_eq!(err.to_string(), "Repayment failed: no outstanding debt");
    }

    #[test]
    fn test_boxed_facility_delegates() {
        let mut facility: Box<dyn LendingFacility> =
            Box::new(LendingPool::new(Decimal::from_i64(1000), Decimal::from_i64(10)));
        facility.borrow(Decimal::from_i64(400)).unwrap();
        assert_eq!(facility.available_liquidity(), Decimal::from_i64(600));
        assert_eq!(facility.current_borrow_rate_percent(), Decimal::from_i64(10));
    }
}
