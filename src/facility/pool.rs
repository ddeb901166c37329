//! In-memory quote lending pool.

use super::{FacilityError, LendingFacility};
use crate::domain::Decimal;
use tracing::{debug, warn};

/// Quote lending pool tracking liquidity, outstanding principal and interest income.
///
/// Repayments first retire outstanding principal; anything above it is
/// booked as interest and returned to the pool's liquidity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingPool {
    total_liquidity: Decimal,
    total_borrowed: Decimal,
    interest_collected: Decimal,
    borrow_rate_percent: Decimal,
    paused: bool,
}

impl LendingPool {
    /// Pool holding `initial_liquidity` of quote and lending at `borrow_rate_percent` APY.
    pub fn new(initial_liquidity: Decimal, borrow_rate_percent: Decimal) -> Self {
        Self {
            total_liquidity: initial_liquidity.max(Decimal::zero()),
            total_borrowed: Decimal::zero(),
            interest_collected: Decimal::zero(),
            borrow_rate_percent,
            paused: false,
        }
    }

    /// Lender deposit.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), FacilityError> {
        if !amount.is_positive() {
            return Err(FacilityError::InvalidAmount(amount));
        }
        self.total_liquidity = self.total_liquidity + amount;
        debug!(amount=%amount, total_liquidity=%self.total_liquidity, "Pool deposit");
        Ok(())
    }

    pub fn set_borrow_rate_percent(&mut self, rate: Decimal) {
        self.borrow_rate_percent = rate;
    }

    /// Stop lending and accepting repayments.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn total_liquidity(&self) -> Decimal {
        self.total_liquidity
    }

    pub fn total_borrowed(&self) -> Decimal {
        self.total_borrowed
    }

    pub fn interest_collected(&self) -> Decimal {
        self.interest_collected
    }

    /// Share of liquidity currently lent out, 0 for an empty pool.
    pub fn utilization(&self) -> Decimal {
        self.total_borrowed
            .checked_div(self.total_liquidity)
            .unwrap_or_else(Decimal::zero)
    }
}

impl LendingFacility for LendingPool {
    fn borrow(&mut self, amount: Decimal) -> Result<(), FacilityError> {
        if amount.is_negative() {
            return Err(FacilityError::InvalidAmount(amount));
        }
        let available = self.available_liquidity();
        if amount > available {
            warn!(requested=%amount, available=%available, "Borrow rejected");
            return Err(FacilityError::InsufficientLiquidity {
                requested: amount,
                available,
            });
        }

        self.total_borrowed = self.total_borrowed + amount;
        debug!(amount=%amount, total_borrowed=%self.total_borrowed, "Pool borrow");
        Ok(())
    }

    fn repay(&mut self, amount: Decimal) -> Result<(), FacilityError> {
        if self.paused {
            warn!(amount=%amount, "Repay rejected: pool is paused");
            return Err(FacilityError::RepaymentFailed("pool is paused".to_string()));
        }
        if !amount.is_positive() {
            return Err(FacilityError::InvalidAmount(amount));
        }
        if !self.total_borrowed.is_positive() {
            return Err(FacilityError::RepaymentFailed(
                "no outstanding debt".to_string(),
            ));
        }

        let principal = amount.min(self.total_borrowed);
        let interest = amount - principal;
        self.total_borrowed = self.total_borrowed - principal;
        self.total_liquidity = self.total_liquidity + interest;
        self.interest_collected = self.interest_collected + interest;
        debug!(
            principal=%principal,
            interest=%interest,
            total_borrowed=%self.total_borrowed,
            "Pool repay"
        );
        Ok(())
    }

    fn available_liquidity(&self) -> Decimal {
        if self.paused {
            return Decimal::zero();
        }
        (self.total_liquidity - self.total_borrowed).max(Decimal::zero())
    }

    fn current_borrow_rate_percent(&self) -> Decimal {
        self.borrow_rate_percent
    }
}
