use anyhow::Context;
use leverage_ledger::{
    config::Config, Asset, Clock, ExchangeRate, InMemoryPositionRepository, LendingPool,
    ManualClock, OpenRequest, Owner, PositionLedger, SystemClock,
};

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Simulation failed: {:#}", e);
        std::process::exit(1);
    }
}

/// Open one position from the configured scenario, let time pass, report its
/// health and close it.
fn run(config: &Config) -> anyhow::Result<()> {
    let sim = &config.simulation;
    let clock = ManualClock::new(SystemClock.now());
    let pool = LendingPool::new(config.pool_liquidity, config.pool_borrow_rate_percent);
    let mut ledger = PositionLedger::new(pool, InMemoryPositionRepository::new(), clock.clone())
        .with_rate_model(config.rate_model())
        .with_health_factor(config.health_factor()?);

    let position = ledger
        .open(OpenRequest {
            owner: Owner::new("simulator"),
            base_asset: Asset::new("SOL"),
            collateral_amount: sim.collateral,
            leverage_factor: sim.leverage,
            current_price: sim.price,
            current_exchange_rate: ExchangeRate::ONE,
        })
        .context("opening simulated position")?;
    println!("{}", serde_json::to_string_pretty(&position)?);

    clock.advance(sim.elapsed_seconds);

    let health = ledger
        .health(&position.id, sim.price)
        .context("computing position health")?;
    println!("{}", serde_json::to_string_pretty(&health)?);

    let apy = ledger.rate_model().apy_from_rates(
        position.entry_exchange_rate,
        sim.exit_rate,
        sim.elapsed_seconds,
    );
    tracing::info!(apy_percent=%apy, "Staking yield over simulated period");

    let settlement = ledger
        .close(&position.id, sim.price, sim.exit_rate, None)
        .context("closing simulated position")?;
    println!("{}", serde_json::to_string_pretty(&settlement)?);

    tracing::info!(
        pool_liquidity=%ledger.facility().total_liquidity(),
        pool_borrowed=%ledger.facility().total_borrowed(),
        interest_collected=%ledger.facility().interest_collected(),
        "Simulation complete"
    );
    Ok(())
}
