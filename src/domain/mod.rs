//! Domain types for the leveraged-position ledger.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Fixed-point exchange rates and basis-point rates
//! - Domain primitives: Timestamp, Owner, Asset, PositionId
//! - Position, leverage tier and settlement records

pub mod decimal;
pub mod position;
pub mod primitives;
pub mod rate;

pub use decimal::Decimal;
pub use position::{LeverageTier, Position, SettlementResult, LEVERAGE_TIERS};
pub use primitives::{Asset, Owner, PositionId, Timestamp};
pub use rate::{Bps, ExchangeRate, BPS_DENOMINATOR, RATE_SCALE};
