use crate::domain::observation::OracleState;
use crate::domain::ports::ObservationSource;
use serde::{Deserialize, Serialize};

/// Inclusive range of unwrapped source indices.
///
/// `start > end` encodes "nothing to do". `end` may exceed the source
/// capacity when the pending data wraps around the source ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRange {
    pub start: u64,
    pub end: u64,
}

impl IndexRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// The empty range that follows `last`.
    pub fn empty_after(last: u64) -> Self {
        Self {
            start: last + 1,
            end: last,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Keeps at most `max_len` indices from the front.
    pub fn clamp(&self, max_len: u64) -> Self {
        if self.is_empty() || max_len == 0 {
            return Self::empty_after(self.start.saturating_sub(1));
        }
        Self {
            start: self.start,
            end: self.end.min(self.start.saturating_add(max_len - 1)),
        }
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}

/// Source indices written since the checkpoint in `state`.
///
/// `capacity` is the source ring size; it must be non-zero. An unmoved
/// cursor only means a full cycle when the slot after the checkpoint holds a
/// strictly newer sample, otherwise it means no new data.
pub fn pending_range(state: &OracleState, source: &dyn ObservationSource, capacity: u64) -> IndexRange {
    let last = state.last_checked_source_index;
    let last_slot = last % capacity;
    let cur = source.current_index() % capacity;

    if cur == last_slot {
        let next = source.observation_at((last + 1) % capacity);
        if next.initialized && next.timestamp > state.last_timestamp {
            return IndexRange::new(last + 1, last + capacity);
        }
        return IndexRange::empty_after(last);
    }

    let advanced = (cur + capacity - last_slot) % capacity;
    IndexRange::new(last + 1, last + advanced)
}
