//! Volatility Oracle Server - headless catch-up and reporting
//!
//! Feeds simulated source rings, keeps their derived buffers caught up and
//! pushes realized variance reports as structured JSON to stdout.
//!
//! # Usage
//! ```sh
//! SIMULATION_SOURCES=ETH/USDC,WBTC/ETH SNAPSHOT_DIR=./snapshots cargo run --bin vol-oracle-server
//! ```
//!
//! # Environment Variables
//! - `VOL_ORACLE_MAX_FILL` - Source entries consumed per backfill call (default: 100)
//! - `KEEPER_INTERVAL_SECONDS` - Seconds between keeper passes (default: 15)
//! - `OBSERVABILITY_INTERVAL` - Seconds between reports (default: 60)
//! - `SNAPSHOT_DIR` - Restore on start and save on shutdown when set

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;
use vol_oracle::application::{BackfillKeeper, VolOracle};
use vol_oracle::config::Config;
use vol_oracle::domain::observation::SourceObservation;
use vol_oracle::domain::ports::ObservationSource;
use vol_oracle::infrastructure::observability::VolReporter;
use vol_oracle::infrastructure::simulation::{RandomWalkFeed, RandomWalkTicks};
use vol_oracle::infrastructure::{InMemoryObservationSource, SnapshotStore, SystemClock};

#[derive(Parser)]
#[command(author, version, about = "Realized volatility oracle server", long_about = None)]
struct Cli {
    /// Source entries consumed per backfill call (overrides VOL_ORACLE_MAX_FILL)
    #[arg(long)]
    max_fill: Option<u64>,

    /// Seconds between keeper passes (overrides KEEPER_INTERVAL_SECONDS)
    #[arg(long)]
    keeper_interval: Option<u64>,

    /// Snapshot directory (overrides SNAPSHOT_DIR)
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Vol Oracle Server {} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env()?;
    if let Some(max_fill) = cli.max_fill {
        config.oracle = config.oracle.with_max_fill(max_fill);
        config.oracle.validate().context("Invalid --max-fill")?;
    }
    if let Some(interval) = cli.keeper_interval {
        config.keeper.interval_seconds = interval;
    }
    if cli.snapshot_dir.is_some() {
        config.snapshot_dir = cli.snapshot_dir;
    }
    info!(
        "Configuration loaded: {:?}, sources={:?}",
        config.oracle, config.simulation.source_ids
    );

    let oracle = Arc::new(VolOracle::new(config.oracle));

    let store = match &config.snapshot_dir {
        Some(dir) => Some(SnapshotStore::new(dir)?),
        None => None,
    };
    if let Some(store) = &store {
        for snapshot in store.load_all()? {
            if let Err(e) = oracle.restore(snapshot) {
                warn!("Skipping snapshot: {}", e);
            }
        }
    }

    // Simulated rings resume from any restored checkpoint
    let clock = Arc::new(SystemClock);
    let mut sources: Vec<Arc<InMemoryObservationSource>> = Vec::new();
    for id in &config.simulation.source_ids {
        let source = Arc::new(InMemoryObservationSource::new(id.clone(), config.simulation.capacity));
        let state = oracle.get_oracle_state(id);
        if state.initialized {
            let slot = state.last_checked_source_index % source.capacity();
            source.set_slot(
                slot,
                SourceObservation::new(state.last_timestamp, state.last_tick_cumulative),
            );
            source.set_current_index(slot);
        }
        sources.push(source);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handles = Vec::new();

    for source in &sources {
        let feed = RandomWalkFeed::new(
            source.clone(),
            Box::new(RandomWalkTicks::new(config.simulation.tick_volatility)),
            clock.clone(),
            config.simulation.initial_tick,
            Duration::from_secs(1),
        );
        handles.push(tokio::spawn(feed.run(shutdown_rx.clone())));
    }

    let keeper = BackfillKeeper::new(
        oracle.clone(),
        sources
            .iter()
            .map(|s| s.clone() as Arc<dyn ObservationSource>)
            .collect(),
        Duration::from_secs(config.keeper.interval_seconds.max(1)),
        config.keeper.max_rounds,
    );
    handles.push(tokio::spawn(keeper.run(shutdown_rx.clone())));

    if config.observability.enabled {
        let reporter = VolReporter::new(
            oracle.clone(),
            config.observability.window_hours.clone(),
            config.observability.interval_seconds,
        );
        handles.push(tokio::spawn(reporter.run(shutdown_rx.clone())));
        info!(
            "Vol reporter started (interval: {}s)",
            config.observability.interval_seconds
        );
    } else {
        info!("Vol reporting disabled.");
    }

    info!("Server running. Press Ctrl+C to shutdown.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Stopping tasks...");
    shutdown_tx.send(true).ok();
    for handle in handles {
        handle.await.ok();
    }

    if let Some(store) = &store {
        for source_id in oracle.sources() {
            let snapshot = oracle.snapshot(&source_id)?;
            store.save(&snapshot)?;
        }
    }

    info!("Exiting.");
    Ok(())
}
