//! Pure computation engine(s) for deterministic position accounting.

pub mod exchange_rate;
pub mod fees;
pub mod health;
pub mod interest;
pub mod ledger;

pub use exchange_rate::{ExchangeRateModel, UnwrapOutcome, WrapOutcome};
pub use fees::{CloseFees, FeeSplit};
pub use health::{HealthFactor, HealthReport, RiskTier};
pub use interest::SECONDS_PER_YEAR;
pub use ledger::{OpenRequest, PositionLedger};
