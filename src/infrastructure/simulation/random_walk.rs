use crate::domain::ports::{Clock, ObservationSource};
use crate::infrastructure::in_memory_source::InMemoryObservationSource;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, Duration};
use tracing::{debug, info};

/// Produces the next tick from the current one.
pub trait TickModel: Send + Sync {
    fn next_tick(&self, current: i64) -> i64;
}

/// Uniform random step in `[-max_step, max_step]`.
#[derive(Debug, Clone)]
pub struct RandomWalkTicks {
    max_step: i64,
}

impl RandomWalkTicks {
    pub fn new(max_step: i64) -> Self {
        Self {
            max_step: max_step.abs(),
        }
    }
}

impl TickModel for RandomWalkTicks {
    fn next_tick(&self, current: i64) -> i64 {
        let mut rng = rand::rng();
        current + rng.random_range(-self.max_step..=self.max_step)
    }
}

/// Tick that never moves.
pub struct ConstantTick;

impl TickModel for ConstantTick {
    fn next_tick(&self, current: i64) -> i64 {
        current
    }
}

/// Writes one sample per interval into an in-memory source ring.
pub struct RandomWalkFeed {
    source: Arc<InMemoryObservationSource>,
    model: Box<dyn TickModel>,
    clock: Arc<dyn Clock>,
    tick: i64,
    interval: Duration,
}

impl RandomWalkFeed {
    pub fn new(
        source: Arc<InMemoryObservationSource>,
        model: Box<dyn TickModel>,
        clock: Arc<dyn Clock>,
        initial_tick: i64,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            model,
            clock,
            tick: initial_tick,
            interval,
        }
    }

    pub fn tick(&self) -> i64 {
        self.tick
    }

    /// Records a sample at the clock's current second.
    ///
    /// Returns false when the clock has not advanced past the newest sample.
    pub fn step(&mut self) -> bool {
        let now = self.clock.now();
        if let Some(latest) = self.source.latest() {
            if now <= latest.timestamp {
                return false;
            }
        }

        // The sample closes the interval the previous tick was held for.
        self.source.record(now, self.tick);
        self.tick = self.model.next_tick(self.tick);
        debug!("RandomWalkFeed: next tick {}", self.tick);
        true
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "RandomWalkFeed: Starting simulation for {} (interval: {:?})",
            self.source.source_id(),
            self.interval
        );

        let mut interval = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.step();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
