//! Simple (non-compounding) borrow interest.

use crate::domain::{Decimal, Timestamp};
use crate::error::{ensure_non_negative, LedgerError};

/// 365 days.
pub const SECONDS_PER_YEAR: i64 = 31_536_000;

/// Interest owed on `principal` after `elapsed_seconds` at an annual rate.
///
/// `principal * (annual_rate_percent / 100) * (elapsed_seconds / SECONDS_PER_YEAR)`.
/// Interest is charged at each close, never capitalised. A negative
/// `elapsed_seconds` counts as zero.
pub fn simple_interest(
    principal: Decimal,
    annual_rate_percent: Decimal,
    elapsed_seconds: i64,
) -> Result<Decimal, LedgerError> {
    ensure_non_negative("principal", principal)?;
    if annual_rate_percent.is_negative() {
        return Err(LedgerError::InvalidRate(annual_rate_percent));
    }

    let elapsed = Decimal::from_i64(elapsed_seconds.max(0));
    let denominator = Decimal::hundred() * Decimal::from_i64(SECONDS_PER_YEAR);

    // Multiply first so exact whole-year spans stay exact.
    principal
        .checked_mul(annual_rate_percent)
        .and_then(|v| v.checked_mul(elapsed))
        .and_then(|v| v.checked_div(denominator))
        .ok_or(LedgerError::ArithmeticOverflow("interest"))
}

/// Seconds a position has been accruing, never negative.
pub fn elapsed_seconds(opened_at: Timestamp, now: Timestamp) -> i64 {
    now.seconds_since(opened_at)
}
