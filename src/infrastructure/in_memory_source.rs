//! In-memory source ring.
//!
//! Mirrors how an AMM pool stores its price accumulator: a fixed ring of
//! `(timestamp, cumulative_tick)` samples with a cursor on the newest slot.
//! Used by tests and by the simulated feed of the headless server.

use crate::domain::observation::SourceObservation;
use crate::domain::ports::ObservationSource;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

struct Ring {
    cursor: u64,
    written: u64,
    slots: Vec<SourceObservation>,
}

pub struct InMemoryObservationSource {
    id: String,
    capacity: u64,
    ring: RwLock<Ring>,
}

impl std::fmt::Debug for InMemoryObservationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObservationSource")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("ring", &"<RwLock>")
            .finish()
    }
}

impl InMemoryObservationSource {
    pub fn new(id: impl Into<String>, capacity: u64) -> Self {
        let capacity = capacity.max(1);
        Self {
            id: id.into(),
            capacity,
            ring: RwLock::new(Ring {
                cursor: 0,
                written: 0,
                slots: vec![SourceObservation::uninitialized(); capacity as usize],
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Ring> {
        match self.ring.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("InMemoryObservationSource [{}]: Lock poisoned during read, recovering", self.id);
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring> {
        match self.ring.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("InMemoryObservationSource [{}]: Lock poisoned during write, recovering", self.id);
                poisoned.into_inner()
            }
        }
    }

    /// Appends a raw sample at the slot after the cursor and moves the cursor onto it.
    pub fn push(&self, timestamp: i64, cumulative_tick: i64) {
        let mut ring = self.write();
        let slot = if ring.written == 0 {
            0
        } else {
            (ring.cursor + 1) % self.capacity
        };
        ring.slots[slot as usize] = SourceObservation::new(timestamp, cumulative_tick);
        ring.cursor = slot;
        ring.written += 1;
    }

    /// Appends a sample for a tick held since the previous sample.
    ///
    /// The cumulative grows by `tick * elapsed`. The very first sample starts
    /// the accumulator at zero.
    pub fn record(&self, timestamp: i64, tick: i64) {
        let cumulative = match self.latest() {
            Some(last) => last.cumulative_tick + tick * (timestamp - last.timestamp),
            None => 0,
        };
        self.push(timestamp, cumulative);
    }

    /// Newest sample, if anything has been written.
    pub fn latest(&self) -> Option<SourceObservation> {
        let ring = self.read();
        (ring.written > 0).then(|| ring.slots[ring.cursor as usize])
    }

    /// Total samples ever written.
    pub fn written(&self) -> u64 {
        self.read().written
    }

    /// Overwrites a physical slot without moving the cursor.
    pub fn set_slot(&self, index: u64, observation: SourceObservation) {
        let mut ring = self.write();
        let slot = (index % self.capacity) as usize;
        ring.slots[slot] = observation;
    }

    /// Moves the cursor without writing.
    pub fn set_current_index(&self, index: u64) {
        let mut ring = self.write();
        ring.cursor = index % self.capacity;
        ring.written = ring.written.max(1);
    }
}

impl ObservationSource for InMemoryObservationSource {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn current_index(&self) -> u64 {
        self.read().cursor
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn observation_at(&self, index: u64) -> SourceObservation {
        let ring = self.read();
        ring.slots
            .get(index as usize)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accumulates_tick_times_elapsed() {
        let source = InMemoryObservationSource::new("pool", 8);
        source.record(100, 7);
        source.record(110, 5);
        source.record(112, -3);

        assert_eq!(source.current_index(), 2);
        assert_eq!(source.observation_at(0), SourceObservation::new(100, 0));
        assert_eq!(source.observation_at(1), SourceObservation::new(110, 50));
        assert_eq!(source.observation_at(2), SourceObservation::new(112, 44));
        assert!(!source.observation_at(3).initialized);
    }

    #[test]
    fn test_push_wraps_cursor() {
        let source = InMemoryObservationSource::new("pool", 3);
        for i in 0..5 {
            source.push(1000 + i, i * 10);
        }

        assert_eq!(source.current_index(), 1);
        assert_eq!(source.written(), 5);
        assert_eq!(source.observation_at(1), SourceObservation::new(1004, 40));
        assert_eq!(source.observation_at(2), SourceObservation::new(1002, 20));
    }

    #[test]
    fn test_out_of_range_reads_are_uninitialized() {
        let source = InMemoryObservationSource::new("pool", 3);
        assert!(source.latest().is_none());
        assert!(!source.observation_at(42).initialized);
    }
}
