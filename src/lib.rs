pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod facility;
pub mod repo;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use domain::{
    Asset, Bps, Decimal, ExchangeRate, LeverageTier, Owner, Position, PositionId,
    SettlementResult, Timestamp,
};
pub use engine::{
    ExchangeRateModel, HealthFactor, HealthReport, OpenRequest, PositionLedger, RiskTier,
};
pub use error::LedgerError;
pub use facility::{FacilityError, LendingFacility, LendingPool};
pub use repo::{InMemoryPositionRepository, PositionRepository};
