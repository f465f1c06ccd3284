use crate::application::vol_oracle::VolOracle;
use crate::domain::ports::ObservationSource;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

/// What one keeper pass did for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeeperRound {
    pub source_id: String,
    pub batches: u32,
    pub processed: u64,
    pub caught_up: bool,
}

/// Drives catch-up for a set of sources.
///
/// Each pass calls `fill_in_observations` until a source is caught up or
/// `max_rounds` batches ran, so a long gap is worked off over several passes
/// without one source starving the others.
pub struct BackfillKeeper {
    oracle: Arc<VolOracle>,
    sources: Vec<Arc<dyn ObservationSource>>,
    interval: Duration,
    max_rounds: u32,
}

impl BackfillKeeper {
    pub fn new(
        oracle: Arc<VolOracle>,
        sources: Vec<Arc<dyn ObservationSource>>,
        interval: Duration,
        max_rounds: u32,
    ) -> Self {
        Self {
            oracle,
            sources,
            interval,
            max_rounds: max_rounds.max(1),
        }
    }

    /// One pass over every source. Sources not yet tracked are initialized first.
    pub fn run_once(&self) -> Vec<KeeperRound> {
        let mut rounds = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let source = source.as_ref();
            let source_id = source.source_id().to_string();

            if !self.oracle.is_initialized(&source_id) {
                if let Err(e) = self.oracle.init_pool(source) {
                    warn!("BackfillKeeper: Failed to initialize {}: {}", source_id, e);
                    continue;
                }
            }

            let mut round = KeeperRound {
                source_id,
                batches: 0,
                processed: 0,
                caught_up: false,
            };

            while round.batches < self.max_rounds {
                match self.oracle.fill_in_observations(source) {
                    Ok(report) => {
                        round.batches += 1;
                        round.processed += report.processed();
                        if report.caught_up() {
                            round.caught_up = true;
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("BackfillKeeper: Backfill failed for {}: {}", round.source_id, e);
                        break;
                    }
                }
            }

            if round.processed > 0 && !round.caught_up {
                debug!(
                    "BackfillKeeper: {} still behind after {} batches",
                    round.source_id, round.batches
                );
            }
            rounds.push(round);
        }

        rounds
    }

    /// Runs passes on the configured interval until `shutdown` flips to true.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "BackfillKeeper: Started for {} sources (interval: {:?}, max rounds: {})",
            self.sources.len(),
            self.interval,
            self.max_rounds
        );

        let mut interval = time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let rounds = self.run_once();
                    let processed: u64 = rounds.iter().map(|r| r.processed).sum();
                    if processed > 0 {
                        info!("BackfillKeeper: Pass consumed {} source observations", processed);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("BackfillKeeper: Shutdown requested, stopping");
                        break;
                    }
                }
            }
        }
    }
}
