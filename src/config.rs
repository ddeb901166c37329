use crate::domain::{Decimal, ExchangeRate};
use crate::engine::exchange_rate::DEFAULT_MIN_APY_WINDOW_SECONDS;
use crate::engine::{ExchangeRateModel, HealthFactor, SECONDS_PER_YEAR};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub liquidation_penalty_multiplier: Decimal,
    pub apy_min_window_seconds: i64,
    pub pool_liquidity: Decimal,
    pub pool_borrow_rate_percent: Decimal,
    pub simulation: SimulationConfig,
}

/// Scenario driven by the simulator binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    pub collateral: Decimal,
    pub leverage: Decimal,
    pub price: Decimal,
    pub elapsed_seconds: i64,
    pub exit_rate: ExchangeRate,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let liquidation_penalty_multiplier =
            parse_decimal(&env_map, "LIQUIDATION_PENALTY_MULTIPLIER", "1")?;
        if !liquidation_penalty_multiplier.is_positive() {
            return Err(ConfigError::InvalidValue(
                "LIQUIDATION_PENALTY_MULTIPLIER".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let apy_min_window_seconds = env_map
            .get("APY_MIN_WINDOW_SECONDS")
            .map(|s| s.as_str())
            .map(str::parse::<i64>)
            .unwrap_or(Ok(DEFAULT_MIN_APY_WINDOW_SECONDS))
            .ok()
            .filter(|v| *v >= 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "APY_MIN_WINDOW_SECONDS".to_string(),
                    "must be a non-negative i64".to_string(),
                )
            })?;

        let pool_liquidity = parse_decimal(&env_map, "POOL_LIQUIDITY", "1000000")?;
        let pool_borrow_rate_percent = parse_decimal(&env_map, "POOL_BORROW_RATE_PERCENT", "10")?;
        if pool_borrow_rate_percent.is_negative() {
            return Err(ConfigError::InvalidValue(
                "POOL_BORROW_RATE_PERCENT".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let simulation = SimulationConfig {
            collateral: parse_decimal(&env_map, "SIM_COLLATERAL", "100")?,
            leverage: parse_decimal(&env_map, "SIM_LEVERAGE", "2")?,
            price: parse_decimal(&env_map, "SIM_PRICE", "200")?,
            elapsed_seconds: env_map
                .get("SIM_ELAPSED_SECONDS")
                .map(|s| s.parse::<i64>())
                .unwrap_or(Ok(SECONDS_PER_YEAR))
                .map_err(|_| {
                    ConfigError::InvalidValue(
                        "SIM_ELAPSED_SECONDS".to_string(),
                        "must be a valid i64".to_string(),
                    )
                })?,
            exit_rate: env_map
                .get("SIM_EXIT_RATE")
                .map(|s| s.parse::<u64>())
                .unwrap_or(Ok(1_050_000))
                .map(ExchangeRate::from_scaled)
                .map_err(|_| {
                    ConfigError::InvalidValue(
                        "SIM_EXIT_RATE".to_string(),
                        "must be a fixed-point u64 (1.0 = 1000000)".to_string(),
                    )
                })?,
        };

        Ok(Config {
            liquidation_penalty_multiplier,
            apy_min_window_seconds,
            pool_liquidity,
            pool_borrow_rate_percent,
            simulation,
        })
    }

    pub fn rate_model(&self) -> ExchangeRateModel {
        ExchangeRateModel::new(self.apy_min_window_seconds)
    }

    pub fn health_factor(&self) -> Result<HealthFactor, ConfigError> {
        HealthFactor::new(self.liquidation_penalty_multiplier).map_err(|e| {
            ConfigError::InvalidValue("LIQUIDATION_PENALTY_MULTIPLIER".to_string(), e.to_string())
        })
    }
}

fn parse_decimal(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    let raw = env_map.get(key).map(|s| s.trim()).unwrap_or(default);
    Decimal::from_str_canonical(raw).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), format!("must be a decimal, got {}", raw))
    })
}
