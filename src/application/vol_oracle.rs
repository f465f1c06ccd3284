//! Process-wide volatility oracle.
//!
//! Maps each tracked source to its own [`PoolOracle`] behind a dedicated
//! mutex. Mutations of one source are serialized by that mutex; distinct
//! sources never contend beyond the brief registry lookup.

use crate::domain::errors::OracleError;
use crate::domain::observation::{DerivedObservation, OracleState};
use crate::domain::oracle::config::{OracleConfig, SECONDS_PER_DAY, SECONDS_PER_HOUR};
use crate::domain::oracle::{FillReport, IndexRange, OracleSnapshot, PoolOracle};
use crate::domain::ports::{Clock, ObservationSource};
use crate::infrastructure::clock::SystemClock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info};

type PoolHandle = Arc<Mutex<PoolOracle>>;

pub struct VolOracle {
    config: OracleConfig,
    clock: Arc<dyn Clock>,
    pools: RwLock<HashMap<String, PoolHandle>>,
}

impl std::fmt::Debug for VolOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolOracle")
            .field("config", &self.config)
            .field("pools", &"<RwLock>")
            .finish()
    }
}

fn lock_pool(pool: &Mutex<PoolOracle>) -> MutexGuard<'_, PoolOracle> {
    match pool.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            error!("VolOracle: Pool lock poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl VolOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: OracleConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            pools: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> OracleConfig {
        self.config
    }

    /// Identifiers of all initialized sources, sorted.
    pub fn sources(&self) -> Vec<String> {
        let pools = match self.pools.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut ids: Vec<String> = pools.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_initialized(&self, source_id: &str) -> bool {
        self.pool(source_id).is_ok()
    }

    fn pool(&self, source_id: &str) -> Result<PoolHandle, OracleError> {
        let pools = match self.pools.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        pools
            .get(source_id)
            .cloned()
            .ok_or_else(|| OracleError::NotInitialized {
                source_id: source_id.to_string(),
            })
    }

    fn with_pool<T>(
        &self,
        source_id: &str,
        f: impl FnOnce(&mut PoolOracle) -> Result<T, OracleError>,
    ) -> Result<T, OracleError> {
        let handle = self.pool(source_id)?;
        let mut pool = lock_pool(&handle);
        f(&mut pool)
    }

    fn insert(&self, pool: PoolOracle) -> Result<OracleState, OracleError> {
        let mut pools = match self.pools.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if pools.contains_key(pool.source_id()) {
            return Err(OracleError::AlreadyInitialized {
                source_id: pool.source_id().to_string(),
            });
        }
        let state = pool.state();
        pools.insert(pool.source_id().to_string(), Arc::new(Mutex::new(pool)));
        Ok(state)
    }

    /// Starts tracking `source`, seeded from the sample under its cursor.
    pub fn init_pool(&self, source: &dyn ObservationSource) -> Result<OracleState, OracleError> {
        if self.is_initialized(source.source_id()) {
            return Err(OracleError::AlreadyInitialized {
                source_id: source.source_id().to_string(),
            });
        }

        let pool = PoolOracle::seed(self.config, source)?;
        let seed = pool.newest();
        let state = self.insert(pool)?;

        info!(
            "VolOracle: Initialized {} at source index {} (ts={}, tick_cumulative={})",
            source.source_id(),
            state.last_checked_source_index,
            seed.timestamp,
            seed.tick_cumulative
        );
        Ok(state)
    }

    /// Source indices written since the last backfill.
    pub fn fetch_intermediate_indexes(
        &self,
        source: &dyn ObservationSource,
    ) -> Result<IndexRange, OracleError> {
        self.with_pool(source.source_id(), |pool| pool.pending_range(source))
    }

    /// Consumes up to `max_fill` new source samples.
    ///
    /// Larger gaps take several calls; each resumes from the checkpoint the
    /// previous one committed.
    pub fn fill_in_observations(
        &self,
        source: &dyn ObservationSource,
    ) -> Result<FillReport, OracleError> {
        let report = self.with_pool(source.source_id(), |pool| pool.fill(source))?;

        if report.is_noop() {
            debug!("VolOracle: No new observations for {}", source.source_id());
        } else {
            info!(
                "VolOracle: Filled {} observations for {} (source {}..={}, write_counter={}, remaining={})",
                report.processed(),
                source.source_id(),
                report.filled.start,
                report.filled.end,
                report.write_counter,
                report.pending.len() - report.processed()
            );
        }
        Ok(report)
    }

    /// Checkpoint for `source_id`; uninitialized sources report the default state.
    pub fn get_oracle_state(&self, source_id: &str) -> OracleState {
        match self.pool(source_id) {
            Ok(handle) => lock_pool(&handle).state(),
            Err(_) => OracleState::default(),
        }
    }

    /// Derived entry at `logical_index`.
    ///
    /// Unlike [`VolOracle::get_oracle_state`] there is no zeroed fallback: an
    /// unknown source is `NotInitialized` and an evicted index is
    /// `ObservationNotRetained`.
    pub fn get_observation(
        &self,
        source_id: &str,
        logical_index: u64,
    ) -> Result<DerivedObservation, OracleError> {
        self.with_pool(source_id, |pool| pool.observation(logical_index))
    }

    pub fn index_before_or_at(&self, source_id: &str, target: i64) -> Result<u64, OracleError> {
        self.with_pool(source_id, |pool| pool.index_before_or_at(target))
    }

    /// Realized variance of the average tick from `target` up to the newest entry.
    pub fn calculate_vol(&self, source_id: &str, target: i64) -> Result<i128, OracleError> {
        self.with_pool(source_id, |pool| pool.calculate_vol(target))
    }

    pub fn calculate_vol_by_days(&self, source_id: &str, days: u32) -> Result<i128, OracleError> {
        let target = self.clock.now() - days as i64 * SECONDS_PER_DAY;
        self.calculate_vol(source_id, target)
    }

    pub fn calculate_vol_by_hours(&self, source_id: &str, hours: u32) -> Result<i128, OracleError> {
        let target = self.clock.now() - hours as i64 * SECONDS_PER_HOUR;
        self.calculate_vol(source_id, target)
    }

    pub fn snapshot(&self, source_id: &str) -> Result<OracleSnapshot, OracleError> {
        self.with_pool(source_id, |pool| Ok(pool.snapshot()))
    }

    /// Rebuilds a source from a snapshot taken by [`VolOracle::snapshot`].
    pub fn restore(&self, snapshot: OracleSnapshot) -> Result<OracleState, OracleError> {
        let source_id = snapshot.source_id.clone();
        let pool = PoolOracle::restore(self.config, snapshot)?;
        let state = self.insert(pool)?;
        info!(
            "VolOracle: Restored {} (write_counter={}, last source index {})",
            source_id, state.write_counter, state.last_checked_source_index
        );
        Ok(state)
    }
}
