use serde::{Deserialize, Serialize};

/// A sample read from the external source ring.
///
/// Slots the source has never written come back with `initialized == false`
/// and carry no usable data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceObservation {
    pub timestamp: i64,
    pub cumulative_tick: i64,
    pub initialized: bool,
}

impl SourceObservation {
    pub fn new(timestamp: i64, cumulative_tick: i64) -> Self {
        Self {
            timestamp,
            cumulative_tick,
            initialized: true,
        }
    }

    pub fn uninitialized() -> Self {
        Self::default()
    }
}

/// One entry of the derived observation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DerivedObservation {
    pub timestamp: i64,
    pub tick_cumulative: i64,
    /// Running sum of `avg_tick^2 * elapsed` since the seed entry.
    pub tick_square_cumulative: i128,
}

/// Per-source backfill checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OracleState {
    pub initialized: bool,
    /// Last consumed source index, in unwrapped (logical) terms.
    pub last_checked_source_index: u64,
    pub last_timestamp: i64,
    pub last_tick_cumulative: i64,
    pub last_tick_square_cumulative: i128,
    /// Logical position of the newest derived observation.
    pub write_counter: u64,
}

impl OracleState {
    /// State right after seeding from `seed`, read at source cursor `source_index`.
    pub fn seeded(source_index: u64, seed: &SourceObservation) -> Self {
        Self {
            initialized: true,
            last_checked_source_index: source_index,
            last_timestamp: seed.timestamp,
            last_tick_cumulative: seed.cumulative_tick,
            last_tick_square_cumulative: 0,
            write_counter: 0,
        }
    }
}
