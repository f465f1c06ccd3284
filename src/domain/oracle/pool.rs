use crate::domain::errors::OracleError;
use crate::domain::observation::{DerivedObservation, OracleState};
use crate::domain::oracle::backfill::{StagedBatch, stage_batch};
use crate::domain::oracle::buffer::ObservationBuffer;
use crate::domain::oracle::config::OracleConfig;
use crate::domain::oracle::range::{IndexRange, pending_range};
use crate::domain::oracle::search;
use crate::domain::oracle::volatility;
use crate::domain::ports::ObservationSource;
use serde::{Deserialize, Serialize};

/// Outcome of one backfill call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// Everything that was pending when the call started.
    pub pending: IndexRange,
    /// The part of `pending` consumed by this call.
    pub filled: IndexRange,
    pub write_counter: u64,
}

impl FillReport {
    pub fn processed(&self) -> u64 {
        self.filled.len()
    }

    pub fn is_noop(&self) -> bool {
        self.filled.is_empty()
    }

    /// Whether this call consumed everything that was pending.
    pub fn caught_up(&self) -> bool {
        self.filled.len() == self.pending.len()
    }
}

/// Serializable copy of one source's state and retained observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleSnapshot {
    pub source_id: String,
    pub buffer_capacity: u64,
    pub state: OracleState,
    /// Retained observations, oldest first.
    pub observations: Vec<DerivedObservation>,
}

/// State and derived buffer for a single tracked source.
#[derive(Debug, Clone)]
pub struct PoolOracle {
    source_id: String,
    config: OracleConfig,
    state: OracleState,
    buffer: ObservationBuffer,
}

impl PoolOracle {
    /// Seeds logical position 0 from the sample under the source cursor.
    pub fn seed(config: OracleConfig, source: &dyn ObservationSource) -> Result<Self, OracleError> {
        let capacity = Self::checked_capacity(&config, source)?;
        let cursor = source.current_index() % capacity;
        let sample = source.observation_at(cursor);
        if !sample.initialized {
            return Err(OracleError::UninitializedSourceObservation {
                source_id: source.source_id().to_string(),
                index: cursor,
            });
        }

        let mut buffer = ObservationBuffer::new(config.buffer_capacity);
        buffer.write(
            0,
            DerivedObservation {
                timestamp: sample.timestamp,
                tick_cumulative: sample.cumulative_tick,
                tick_square_cumulative: 0,
            },
        );

        Ok(Self {
            source_id: source.source_id().to_string(),
            config,
            state: OracleState::seeded(cursor, &sample),
            buffer,
        })
    }

    fn checked_capacity(config: &OracleConfig, source: &dyn ObservationSource) -> Result<u64, OracleError> {
        let actual = source.capacity();
        if actual < config.source_capacity || actual == 0 {
            return Err(OracleError::InsufficientSourceCapacity {
                source_id: source.source_id().to_string(),
                required: config.source_capacity,
                actual,
            });
        }
        Ok(actual)
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn state(&self) -> OracleState {
        self.state
    }

    pub fn oldest_logical(&self) -> u64 {
        self.buffer.oldest_logical(self.state.write_counter)
    }

    pub fn newest(&self) -> DerivedObservation {
        self.buffer.at(self.state.write_counter)
    }

    pub fn oldest(&self) -> DerivedObservation {
        self.buffer.at(self.oldest_logical())
    }

    pub fn pending_range(&self, source: &dyn ObservationSource) -> Result<IndexRange, OracleError> {
        let capacity = Self::checked_capacity(&self.config, source)?;
        Ok(pending_range(&self.state, source, capacity))
    }

    /// Stages up to `max_fill` pending samples without touching `self`.
    pub fn stage_fill(
        &self,
        source: &dyn ObservationSource,
    ) -> Result<(IndexRange, StagedBatch), OracleError> {
        let capacity = Self::checked_capacity(&self.config, source)?;
        let pending = pending_range(&self.state, source, capacity);
        let batch = pending.clamp(self.config.max_fill);
        let staged = stage_batch(&self.state, source, capacity, batch)?;
        Ok((pending, staged))
    }

    pub fn commit(&mut self, staged: StagedBatch) {
        let first = staged.first_write();
        for (offset, observation) in staged.observations.into_iter().enumerate() {
            self.buffer.write(first + offset as u64, observation);
        }
        self.state = staged.state;
    }

    /// Consumes up to `max_fill` pending samples; all-or-nothing.
    pub fn fill(&mut self, source: &dyn ObservationSource) -> Result<FillReport, OracleError> {
        let (pending, staged) = self.stage_fill(source)?;
        let filled = staged.range;
        if !filled.is_empty() {
            self.commit(staged);
        }
        Ok(FillReport {
            pending,
            filled,
            write_counter: self.state.write_counter,
        })
    }

    pub fn observation(&self, logical: u64) -> Result<DerivedObservation, OracleError> {
        self.buffer
            .get(self.state.write_counter, logical)
            .ok_or(OracleError::ObservationNotRetained {
                index: logical,
                oldest: self.oldest_logical(),
                newest: self.state.write_counter,
            })
    }

    pub fn index_before_or_at(&self, target: i64) -> Result<u64, OracleError> {
        search::index_before_or_at(&self.buffer, self.state.write_counter, target)
    }

    pub fn calculate_vol(&self, target: i64) -> Result<i128, OracleError> {
        volatility::calculate_vol(&self.buffer, self.state.write_counter, target)
    }

    pub fn snapshot(&self) -> OracleSnapshot {
        OracleSnapshot {
            source_id: self.source_id.clone(),
            buffer_capacity: self.buffer.capacity(),
            state: self.state,
            observations: self
                .buffer
                .retained(self.state.write_counter)
                .map(|(_, observation)| observation)
                .collect(),
        }
    }

    pub fn restore(config: OracleConfig, snapshot: OracleSnapshot) -> Result<Self, OracleError> {
        let mismatch = |reason: String| OracleError::SnapshotMismatch {
            source_id: snapshot.source_id.clone(),
            reason,
        };

        if !snapshot.state.initialized {
            return Err(mismatch("state is not initialized".to_string()));
        }
        if snapshot.buffer_capacity != config.buffer_capacity {
            return Err(mismatch(format!(
                "buffer capacity {} != {}",
                snapshot.buffer_capacity, config.buffer_capacity
            )));
        }
        let newest = snapshot.observations.last().copied();
        if newest.map(|o| (o.timestamp, o.tick_cumulative, o.tick_square_cumulative))
            != Some((
                snapshot.state.last_timestamp,
                snapshot.state.last_tick_cumulative,
                snapshot.state.last_tick_square_cumulative,
            ))
        {
            return Err(mismatch("newest observation disagrees with state".to_string()));
        }

        let buffer = ObservationBuffer::from_retained(
            config.buffer_capacity,
            snapshot.state.write_counter,
            &snapshot.observations,
        )
        .ok_or_else(|| {
            mismatch(format!(
                "{} observations do not cover write counter {}",
                snapshot.observations.len(),
                snapshot.state.write_counter
            ))
        })?;

        Ok(Self {
            source_id: snapshot.source_id.clone(),
            config,
            state: snapshot.state,
            buffer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory_source::InMemoryObservationSource;

    fn source(samples: usize) -> InMemoryObservationSource {
        let source = InMemoryObservationSource::new("pool", 32);
        for i in 0..samples as i64 {
            source.push(100 + i * 10, i * i * 10);
        }
        source.set_current_index(0);
        source
    }

    #[test]
    fn test_stage_fill_leaves_pool_untouched() {
        let source = source(6);
        let pool = PoolOracle::seed(OracleConfig::new(8, 32, 3).unwrap(), &source).unwrap();
        source.set_current_index(5);

        let (pending, staged) = pool.stage_fill(&source).unwrap();
        assert_eq!(pending, IndexRange::new(1, 5));
        assert_eq!(staged.range, IndexRange::new(1, 3));
        assert_eq!(staged.first_write(), 1);
        assert_eq!(pool.state().write_counter, 0);
        assert!(pool.observation(1).is_err());
    }

    #[test]
    fn test_wrapped_snapshot_restores() {
        let source = source(12);
        let config = OracleConfig::new(4, 32, 100).unwrap();
        let mut pool = PoolOracle::seed(config, &source).unwrap();
        source.set_current_index(11);
        let report = pool.fill(&source).unwrap();
        assert!(report.caught_up());
        assert_eq!(pool.oldest_logical(), 8);

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.observations.len(), 4);
        assert_eq!(snapshot.observations[0], pool.oldest());

        let restored = PoolOracle::restore(config, snapshot).unwrap();
        assert_eq!(restored.state(), pool.state());
        for logical in 8..=11 {
            assert_eq!(restored.observation(logical), pool.observation(logical));
        }
    }

    #[test]
    fn test_restore_rejects_inconsistent_snapshot() {
        let source = source(3);
        let config = OracleConfig::new(8, 32, 100).unwrap();
        let mut pool = PoolOracle::seed(config, &source).unwrap();
        source.set_current_index(2);
        pool.fill(&source).unwrap();

        let mut truncated = pool.snapshot();
        truncated.observations.pop();
        assert!(matches!(
            PoolOracle::restore(config, truncated),
            Err(OracleError::SnapshotMismatch { .. })
        ));

        let mut blank = pool.snapshot();
        blank.state = OracleState::default();
        assert!(PoolOracle::restore(config, blank).is_err());
    }
}
