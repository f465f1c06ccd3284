use crate::domain::errors::OracleError;
use crate::domain::observation::{DerivedObservation, OracleState, SourceObservation};
use crate::domain::oracle::range::IndexRange;
use crate::domain::ports::ObservationSource;

/// Result of replaying a batch of source samples on top of a checkpoint.
///
/// Nothing is applied until the caller commits it, so a failure part way
/// through a batch leaves the live state untouched.
#[derive(Debug, Clone)]
pub struct StagedBatch {
    pub range: IndexRange,
    pub state: OracleState,
    /// New buffer entries, for logical positions `first_write..=state.write_counter`.
    pub observations: Vec<DerivedObservation>,
}

impl StagedBatch {
    pub fn first_write(&self) -> u64 {
        self.state.write_counter + 1 - self.observations.len() as u64
    }
}

/// Folds one source sample into the running sums.
///
/// The average tick over the interval truncates toward zero before it is
/// squared; this is what keeps chunked and unchunked replays identical.
pub fn accumulate(state: &OracleState, sample: &SourceObservation) -> DerivedObservation {
    let elapsed = (sample.timestamp - state.last_timestamp) as i128;
    let tick_delta = sample.cumulative_tick as i128 - state.last_tick_cumulative as i128;
    let avg_tick = tick_delta / elapsed;

    DerivedObservation {
        timestamp: sample.timestamp,
        tick_cumulative: sample.cumulative_tick,
        tick_square_cumulative: state.last_tick_square_cumulative + avg_tick * avg_tick * elapsed,
    }
}

/// Replays `batch` from `source` on a copy of `state`.
pub fn stage_batch(
    state: &OracleState,
    source: &dyn ObservationSource,
    capacity: u64,
    batch: IndexRange,
) -> Result<StagedBatch, OracleError> {
    let mut next = *state;
    let mut observations = Vec::with_capacity(batch.len() as usize);

    for index in batch.iter() {
        let slot = index % capacity;
        let sample = source.observation_at(slot);
        if !sample.initialized {
            return Err(OracleError::UninitializedSourceObservation {
                source_id: source.source_id().to_string(),
                index: slot,
            });
        }
        if sample.timestamp <= next.last_timestamp {
            return Err(OracleError::NonIncreasingTimestamp {
                source_id: source.source_id().to_string(),
                index: slot,
                previous: next.last_timestamp,
                current: sample.timestamp,
            });
        }

        let derived = accumulate(&next, &sample);
        next.write_counter += 1;
        next.last_timestamp = derived.timestamp;
        next.last_tick_cumulative = derived.tick_cumulative;
        next.last_tick_square_cumulative = derived.tick_square_cumulative;
        next.last_checked_source_index = index;
        observations.push(derived);
    }

    Ok(StagedBatch {
        range: batch,
        state: next,
        observations,
    })
}
