//! Leveraged position lifecycle: open, partial close, full close.
//!
//! Every operation validates first, then talks to the lending facility, and
//! only writes the position back once the facility call succeeded. A
//! rejected borrow creates nothing; a rejected repay leaves the stored
//! position exactly as it was.

use super::exchange_rate::ExchangeRateModel;
use super::fees;
use super::health::{HealthFactor, HealthReport};
use super::interest;
use crate::clock::Clock;
use crate::domain::{
    Asset, Decimal, ExchangeRate, LeverageTier, Owner, Position, PositionId, SettlementResult,
    Timestamp,
};
use crate::error::{ensure_positive, LedgerError};
use crate::facility::LendingFacility;
use crate::repo::PositionRepository;
use tracing::{info, warn};

/// Close amounts this close below the remaining collateral close the whole
/// position, absorbing formatting noise from upstream amount inputs.
pub fn full_close_epsilon() -> Decimal {
    Decimal::from_scaled(1, 4)
}

/// Parameters for opening a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub owner: Owner,
    pub base_asset: Asset,
    pub collateral_amount: Decimal,
    pub leverage_factor: Decimal,
    pub current_price: Decimal,
    pub current_exchange_rate: ExchangeRate,
}

/// Magnitudes left on a position after a partial close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Remaining {
    collateral: Decimal,
    borrowed_principal: Decimal,
    deposited_quote: Decimal,
}

/// Everything a close will do, computed before any side effect.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ClosePlan {
    settlement: SettlementResult,
    remaining: Option<Remaining>,
    at: Timestamp,
}

/// Owns position records and applies the protocol's accounting rules to them.
///
/// Callers serialize access per position; the ledger takes `&mut self` for
/// mutations and does no locking of its own.
pub struct PositionLedger<F, R, C> {
    facility: F,
    repo: R,
    clock: C,
    rates: ExchangeRateModel,
    health: HealthFactor,
}

impl<F, R, C> PositionLedger<F, R, C>
where
    F: LendingFacility,
    R: PositionRepository,
    C: Clock,
{
    pub fn new(facility: F, repo: R, clock: C) -> Self {
        Self {
            facility,
            repo,
            clock,
            rates: ExchangeRateModel::default(),
            health: HealthFactor::default(),
        }
    }

    pub fn with_rate_model(mut self, rates: ExchangeRateModel) -> Self {
        self.rates = rates;
        self
    }

    pub fn with_health_factor(mut self, health: HealthFactor) -> Self {
        self.health = health;
        self
    }

    pub fn facility(&self) -> &F {
        &self.facility
    }

    pub fn facility_mut(&mut self) -> &mut F {
        &mut self.facility
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn rate_model(&self) -> &ExchangeRateModel {
        &self.rates
    }

    pub fn health_factor(&self) -> &HealthFactor {
        &self.health
    }

    /// Look up a stored position.
    pub fn position(&self, id: &PositionId) -> Result<Position, LedgerError> {
        self.repo.get(id).ok_or(LedgerError::PositionNotFound(*id))
    }

    /// Open a leveraged position and borrow its pool-funded leg.
    ///
    /// # Errors
    /// - `InvalidAmount` for a non-positive collateral amount or price
    /// - `InvalidLeverageFactor` for a factor outside the allowed tiers
    /// - `InvalidExchangeRate` for a zero rate
    /// - `InsufficientLiquidity` if the facility cannot lend the borrow amount
    pub fn open(&mut self, request: OpenRequest) -> Result<Position, LedgerError> {
        ensure_positive("collateral amount", request.collateral_amount)?;
        ensure_positive("current price", request.current_price)?;
        if request.current_exchange_rate.is_zero() {
            return Err(LedgerError::InvalidExchangeRate(
                "entry rate must be positive".to_string(),
            ));
        }
        let tier = LeverageTier::for_factor(request.leverage_factor)
            .ok_or(LedgerError::InvalidLeverageFactor(request.leverage_factor))?;

        let open_fee = fees::open_fee(request.collateral_amount)?;
        let collateral = request.collateral_amount - open_fee;
        let collateral_value = collateral
            .checked_mul(request.current_price)
            .ok_or(LedgerError::ArithmeticOverflow("collateral value"))?;
        let exposure = collateral_value
            .checked_mul(tier.factor() - Decimal::one())
            .ok_or(LedgerError::ArithmeticOverflow("leveraged exposure"))?;
        let deposited_quote = tier
            .deposit_share
            .apply(exposure)
            .ok_or(LedgerError::ArithmeticOverflow("deposited quote"))?;
        let borrowed_principal = exposure - deposited_quote;

        if borrowed_principal.is_positive() {
            if let Err(err) = self.facility.borrow(borrowed_principal) {
                warn!(
                    owner=%request.owner,
                    requested=%borrowed_principal,
                    error=%err,
                    "Borrow rejected, position not opened"
                );
                return Err(err.into());
            }
        }

        let position = Position {
            id: PositionId::generate(),
            owner: request.owner,
            base_asset: request.base_asset,
            collateral,
            borrowed_principal,
            deposited_quote,
            leverage_factor: request.leverage_factor,
            entry_exchange_rate: request.current_exchange_rate,
            entry_price: request.current_price,
            open_fee,
            opened_at: self.clock.now(),
            closed_at: None,
            is_open: true,
        };
        self.repo.save(position.clone());

        info!(
            position_id=%position.id,
            owner=%position.owner,
            asset=%position.base_asset,
            collateral=%position.collateral,
            borrowed=%position.borrowed_principal,
            deposited_quote=%position.deposited_quote,
            leverage=%position.leverage_factor,
            "Position opened"
        );
        Ok(position)
    }

    /// Close all of a position, or `close_amount` of its collateral.
    ///
    /// # Errors
    /// - `PositionNotFound`, `PositionAlreadyClosed`
    /// - `InvalidAmount` for a non-positive price or a close amount outside
    ///   `(0, collateral]`
    /// - `InvalidExchangeRate` if the rate fell below the entry rate
    /// - `RepaymentFailed` if the facility rejects the repayment; the stored
    ///   position is not modified
    pub fn close(
        &mut self,
        id: &PositionId,
        current_price: Decimal,
        current_exchange_rate: ExchangeRate,
        close_amount: Option<Decimal>,
    ) -> Result<SettlementResult, LedgerError> {
        let position = self.position(id)?;
        let plan = self.plan_close(&position, current_price, current_exchange_rate, close_amount)?;

        let repay = plan.settlement.repaid_to_facility;
        if repay.is_positive() {
            if let Err(err) = self.facility.repay(repay) {
                warn!(
                    position_id=%id,
                    amount=%repay,
                    error=%err,
                    "Repayment rejected, position left unchanged"
                );
                return Err(err.into());
            }
        }

        let mut updated = position;
        match plan.remaining {
            Some(remaining) => {
                updated.collateral = remaining.collateral;
                updated.borrowed_principal = remaining.borrowed_principal;
                updated.deposited_quote = remaining.deposited_quote;
            }
            None => {
                updated.is_open = false;
                updated.closed_at = Some(plan.at);
            }
        }
        self.repo.save(updated);

        let settlement = plan.settlement;
        info!(
            position_id=%id,
            partial=settlement.is_partial,
            closed_collateral=%settlement.closed_collateral,
            base_returned=%settlement.base_returned,
            quote_returned=%settlement.quote_returned,
            repaid=%settlement.repaid_to_facility,
            interest=%settlement.interest_owed,
            "Position closed"
        );
        if settlement.interest_shortfall.is_positive() {
            warn!(
                position_id=%id,
                shortfall=%settlement.interest_shortfall,
                "Interest exceeded deposited quote"
            );
        }
        Ok(settlement)
    }

    /// Force a full close of a position whose loan-to-value at `current_price`
    /// reached the liquidation threshold.
    ///
    /// # Errors
    /// - `PositionNotLiquidatable` when the position is still below the
    ///   threshold; nothing is repaid or written
    /// - anything `health` or `close` can return
    pub fn liquidate(
        &mut self,
        id: &PositionId,
        current_price: Decimal,
        current_exchange_rate: ExchangeRate,
    ) -> Result<SettlementResult, LedgerError> {
        let report = self.health(id, current_price)?;
        if !report.liquidatable {
            return Err(LedgerError::PositionNotLiquidatable {
                id: *id,
                ltv_bps: report.ltv_bps,
            });
        }

        info!(
            position_id=%id,
            ltv_bps=%report.ltv_bps,
            health_factor=%report.factor,
            "Liquidating position"
        );
        self.close(id, current_price, current_exchange_rate, None)
    }

    /// The settlement `close` would produce now, without repaying or mutating.
    pub fn preview_close(
        &self,
        id: &PositionId,
        current_price: Decimal,
        current_exchange_rate: ExchangeRate,
        close_amount: Option<Decimal>,
    ) -> Result<SettlementResult, LedgerError> {
        let position = self.position(id)?;
        self.plan_close(&position, current_price, current_exchange_rate, close_amount)
            .map(|plan| plan.settlement)
    }

    /// Health of an open position at `current_price`.
    ///
    /// Position value is the collateral at `current_price` plus the quote leg
    /// (deposited and borrowed quote); debt is the borrowed principal plus
    /// interest accrued so far.
    pub fn health(&self, id: &PositionId, current_price: Decimal) -> Result<HealthReport, LedgerError> {
        let position = self.position(id)?;
        if !position.is_open {
            return Err(LedgerError::PositionAlreadyClosed(position.id));
        }
        ensure_positive("current price", current_price)?;

        let elapsed = interest::elapsed_seconds(position.opened_at, self.clock.now());
        let accrued = interest::simple_interest(
            position.borrowed_principal,
            self.facility.current_borrow_rate_percent(),
            elapsed,
        )?;
        let position_value = position
            .collateral_value(current_price)
            .and_then(|v| v.checked_add(position.deposited_quote))
            .and_then(|v| v.checked_add(position.borrowed_principal))
            .ok_or(LedgerError::ArithmeticOverflow("position value"))?;
        let debt = position
            .borrowed_principal
            .checked_add(accrued)
            .ok_or(LedgerError::ArithmeticOverflow("debt"))?;

        self.health.report(position_value, debt)
    }

    fn plan_close(
        &self,
        position: &Position,
        current_price: Decimal,
        current_exchange_rate: ExchangeRate,
        close_amount: Option<Decimal>,
    ) -> Result<ClosePlan, LedgerError> {
        if !position.is_open {
            return Err(LedgerError::PositionAlreadyClosed(position.id));
        }
        ensure_positive("current price", current_price)?;
        if current_exchange_rate < position.entry_exchange_rate {
            return Err(LedgerError::InvalidExchangeRate(format!(
                "current rate {} is below entry rate {}",
                current_exchange_rate, position.entry_exchange_rate
            )));
        }

        let (closed_collateral, is_partial) = match close_amount {
            None => (position.collateral, false),
            Some(amount) => {
                ensure_positive("close amount", amount)?;
                if amount > position.collateral {
                    return Err(LedgerError::InvalidAmount {
                        field: "close amount",
                        value: amount,
                    });
                }
                if amount < position.collateral - full_close_epsilon() {
                    (amount, true)
                } else {
                    (position.collateral, false)
                }
            }
        };

        // A full close settles the exact remaining magnitudes so no dust is left.
        let (borrowed, deposited) = if is_partial {
            (
                proportional(position.borrowed_principal, closed_collateral, position.collateral)?,
                proportional(position.deposited_quote, closed_collateral, position.collateral)?,
            )
        } else {
            (position.borrowed_principal, position.deposited_quote)
        };

        let yield_earned = self.rates.yield_earned(
            closed_collateral,
            position.entry_exchange_rate,
            current_exchange_rate,
        )?;
        let close_fees = fees::close_fees(closed_collateral, yield_earned)?;
        let fee_split = fees::split_fee(close_fees.total())?;

        let at = self.clock.now();
        let elapsed = interest::elapsed_seconds(position.opened_at, at);
        let interest_owed = interest::simple_interest(
            borrowed,
            self.facility.current_borrow_rate_percent(),
            elapsed,
        )?;
        let repaid_to_facility = borrowed
            .checked_add(interest_owed)
            .ok_or(LedgerError::ArithmeticOverflow("repayment"))?;

        let base_returned = (closed_collateral - close_fees.principal_fee)
            + (yield_earned - close_fees.yield_fee);
        let quote_returned = (deposited - interest_owed).max(Decimal::zero());
        let interest_shortfall = (interest_owed - deposited).max(Decimal::zero());
        let closed_collateral_value = closed_collateral
            .checked_mul(current_price)
            .ok_or(LedgerError::ArithmeticOverflow("closed collateral value"))?;

        let remaining = if is_partial {
            Some(Remaining {
                collateral: remainder("collateral", position.collateral, closed_collateral)?,
                borrowed_principal: remainder(
                    "borrowed principal",
                    position.borrowed_principal,
                    borrowed,
                )?,
                deposited_quote: remainder("deposited quote", position.deposited_quote, deposited)?,
            })
        } else {
            None
        };

        Ok(ClosePlan {
            settlement: SettlementResult {
                base_returned,
                quote_returned,
                principal_fee: close_fees.principal_fee,
                yield_fee: close_fees.yield_fee,
                yield_earned,
                interest_owed,
                interest_shortfall,
                repaid_to_facility,
                vault_fee_share: fee_split.vault_share,
                protocol_fee_share: fee_split.protocol_share,
                closed_collateral,
                closed_collateral_value,
                is_partial,
            },
            remaining,
            at,
        })
    }
}

/// `amount * part / whole`, multiplying first.
fn proportional(amount: Decimal, part: Decimal, whole: Decimal) -> Result<Decimal, LedgerError> {
    amount
        .checked_mul(part)
        .and_then(|v| v.checked_div(whole))
        .ok_or(LedgerError::ArithmeticOverflow("close proportion"))
}

fn remainder(field: &'static str, total: Decimal, taken: Decimal) -> Result<Decimal, LedgerError> {
    let left = total
        .checked_sub(taken)
        .ok_or(LedgerError::ArithmeticOverflow(field))?;
    if left.is_negative() {
        return Err(LedgerError::NegativeBalance(field));
    }
    Ok(left)
}
