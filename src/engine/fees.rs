//! Fee schedule: the single source of truth for every protocol fee.

use crate::domain::{Bps, Decimal};
use crate::error::{ensure_non_negative, LedgerError};
use serde::{Deserialize, Serialize};

/// Charged on collateral when a position is opened.
pub const OPEN_FEE_RATE: Bps = Bps(100);
/// Charged on the closed collateral.
pub const CLOSE_PRINCIPAL_FEE_RATE: Bps = Bps(200);
/// Charged on yield realised at close.
pub const CLOSE_YIELD_FEE_RATE: Bps = Bps(1_000);
/// Charged when base asset is wrapped into shares.
pub const WRAP_FEE_RATE: Bps = Bps(50);
/// Charged when shares are unwrapped inside the cooldown window.
pub const UNWRAP_FEE_RATE: Bps = Bps(75);
/// Charged when shares are unwrapped after the cooldown window.
pub const UNWRAP_FEE_RATE_COOLDOWN: Bps = Bps(30);
/// Holding period after which the reduced unwrap fee applies (5 days).
pub const UNWRAP_COOLDOWN_SECONDS: i64 = 5 * 24 * 60 * 60;
/// Portion of every fee that stays in the vault and accrues to share holders.
pub const VAULT_FEE_SHARE: Bps = Bps(8_000);
/// Portion of every fee sent to the protocol treasury.
pub const PROTOCOL_FEE_SHARE: Bps = Bps(2_000);

/// Fees charged by a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseFees {
    pub principal_fee: Decimal,
    pub yield_fee: Decimal,
}

impl CloseFees {
    pub fn total(&self) -> Decimal {
        self.principal_fee + self.yield_fee
    }
}

/// Destination of a collected fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub vault_share: Decimal,
    pub protocol_share: Decimal,
}

fn charge(field: &'static str, amount: Decimal, rate: Bps) -> Result<Decimal, LedgerError> {
    ensure_non_negative(field, amount)?;
    rate.apply(amount)
        .ok_or(LedgerError::ArithmeticOverflow(field))
}

pub fn open_fee(amount: Decimal) -> Result<Decimal, LedgerError> {
    charge("open amount", amount, OPEN_FEE_RATE)
}

pub fn close_fees(principal_amount: Decimal, yield_amount: Decimal) -> Result<CloseFees, LedgerError> {
    Ok(CloseFees {
        principal_fee: charge("close principal", principal_amount, CLOSE_PRINCIPAL_FEE_RATE)?,
        yield_fee: charge("close yield", yield_amount, CLOSE_YIELD_FEE_RATE)?,
    })
}

pub fn wrap_fee(amount: Decimal) -> Result<Decimal, LedgerError> {
    charge("wrap amount", amount, WRAP_FEE_RATE)
}

/// Unwrap fee, tiered on how long the shares were held.
///
/// `held_seconds` below zero counts as zero.
pub fn unwrap_fee(amount: Decimal, held_seconds: i64) -> Result<Decimal, LedgerError> {
    charge("unwrap amount", amount, unwrap_fee_rate(held_seconds))
}

pub fn unwrap_fee_rate(held_seconds: i64) -> Bps {
    if held_seconds >= UNWRAP_COOLDOWN_SECONDS {
        UNWRAP_FEE_RATE_COOLDOWN
    } else {
        UNWRAP_FEE_RATE
    }
}

/// Split a fee between vault and treasury.
///
/// The protocol share is the remainder, so the two always sum to `fee`.
pub fn split_fee(fee: Decimal) -> Result<FeeSplit, LedgerError> {
    let vault_share = charge("fee", fee, VAULT_FEE_SHARE)?;
    Ok(FeeSplit {
        vault_share,
        protocol_share: fee - vault_share,
    })
}
