//! Headless server entrypoint (C9 external surface). Grounded on the
//! teacher's `src/bin/server.rs`: load env/config, build the supervised
//! components, run until a shutdown signal arrives.
//!
//! Runs against the in-memory repository/alert-sink fakes and the synthetic
//! market data source — real provider clients and durable storage are out
//! of scope for this crate (see `domain::ports`).

use anyhow::Result;
use cryptopulse::application::retry::BackoffConfig;
use cryptopulse::application::scheduler::persistence::SchedulerPersistence;
use cryptopulse::application::scheduler::{SchedulerDeps, TierScheduler};
use cryptopulse::application::strategies::registry;
use cryptopulse::application::supervisor::{Supervisor, SupervisorDeps};
use cryptopulse::config::Config;
use cryptopulse::domain::ports::{MarketDataRepository, MarketDataSource};
use cryptopulse::domain::types::{AssetId, PortfolioState};
use cryptopulse::infrastructure::alert_sink::FileAlertSink;
use cryptopulse::infrastructure::clock::SystemClock;
use cryptopulse::infrastructure::observability::Metrics;
use cryptopulse::infrastructure::rate_gate::RateGate;
use cryptopulse::infrastructure::repositories::in_memory::InMemoryMarketDataRepository;
use cryptopulse::infrastructure::synthetic_source::SyntheticMarketDataSource;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(Level::INFO.into()),
        )
        .with(stdout_layer)
        .init();

    info!("cryptopulse server {} starting", env!("CARGO_PKG_VERSION"));

    let config = match std::env::var("CRYPTOPULSE_CONFIG_PATH") {
        Ok(path) => Config::load(path)?,
        Err(_) => Config::load_from_env()?,
    };

    let metrics = Arc::new(Metrics::new()?);
    let clock = Arc::new(SystemClock);
    let repository: Arc<dyn MarketDataRepository> = Arc::new(InMemoryMarketDataRepository::new());

    let mut sources: HashMap<String, Arc<dyn MarketDataSource>> = HashMap::new();
    let mut rate_gates: HashMap<String, Arc<RateGate>> = HashMap::new();
    for provider in &config.providers.list {
        sources.insert(
            provider.name.clone(),
            Arc::new(SyntheticMarketDataSource::new(dec!(100), 60_000)),
        );
        rate_gates.insert(
            provider.name.clone(),
            Arc::new(RateGate::new(
                &provider.name,
                provider.rate_limit_per_window,
                Duration::from_secs(provider.window_seconds),
            )),
        );
    }

    let scheduler_deps = SchedulerDeps {
        sources,
        rate_gates,
        repository: repository.clone(),
        clock,
        metrics: metrics.clone(),
    };

    let configured_tasks = config
        .assets
        .list
        .iter()
        .map(|a| (AssetId::new(a.asset_id.clone()), a.tier, a.provider.clone()))
        .collect();

    let persistence = SchedulerPersistence::new(
        std::env::var("CRYPTOPULSE_STATE_PATH").unwrap_or_else(|_| "cryptopulse-scheduler-state.json".to_string()),
    );
    let backoff = BackoffConfig::default();
    let scheduler = Arc::new(
        TierScheduler::restore_or_new(
            configured_tasks,
            scheduler_deps,
            config.tiers.clone(),
            backoff,
            config.supervisor.disable_threshold,
            config.supervisor.collection_worker_pool_size,
            persistence,
        )
        .await?,
    );

    let strategies = registry::build_enabled(&config.strategies.list);
    let alert_sink = Arc::new(FileAlertSink::new(
        std::env::var("CRYPTOPULSE_ALERTS_DIR").unwrap_or_else(|_| "alerts".to_string()),
    )?);
    let asset_ids: Vec<AssetId> = config
        .assets
        .list
        .iter()
        .map(|a| AssetId::new(a.asset_id.clone()))
        .collect();

    let deps = SupervisorDeps {
        scheduler,
        repository,
        strategies,
        alert_sink,
        metrics,
        portfolio: Arc::new(tokio::sync::RwLock::new(PortfolioState {
            total_equity: dec!(100000),
            current_drawdown: 0.0,
            daily_pnl: rust_decimal::Decimal::ZERO,
            positions: BTreeMap::new(),
            cash: dec!(100000),
        })),
        asset_ids,
    };

    let supervisor = Arc::new(Supervisor::new(
        deps,
        config.tiers,
        config.aggregation,
        config.risk,
        config.alerts,
        config.strategies,
        config.supervisor,
    ));

    supervisor.run().await?;
    info!("cryptopulse server exiting");
    Ok(())
}
