use crate::domain::observation::DerivedObservation;

/// Fixed-capacity ring of derived observations addressed by logical position.
///
/// Logical positions grow forever; the physical slot is
/// `logical % capacity`. Storage grows lazily up to `capacity` and is then
/// overwritten in place. The buffer does not track which positions are live:
/// callers pass the current write counter.
#[derive(Debug, Clone)]
pub struct ObservationBuffer {
    capacity: u64,
    slots: Vec<DerivedObservation>,
}

impl ObservationBuffer {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity: capacity.max(1),
            slots: Vec::new(),
        }
    }

    /// Rebuilds a buffer from its retained window, oldest entry first.
    ///
    /// Returns `None` when `entries` does not exactly cover the window that
    /// `write_counter` implies.
    pub fn from_retained(
        capacity: u64,
        write_counter: u64,
        entries: &[DerivedObservation],
    ) -> Option<Self> {
        let mut buffer = Self::new(capacity);
        let oldest = buffer.oldest_logical(write_counter);
        if entries.len() as u64 != write_counter - oldest + 1 {
            return None;
        }

        let used = (write_counter + 1).min(buffer.capacity) as usize;
        buffer.slots = vec![DerivedObservation::default(); used];
        for (offset, entry) in entries.iter().enumerate() {
            let slot = buffer.physical_slot(oldest + offset as u64);
            buffer.slots[slot] = *entry;
        }
        Some(buffer)
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    #[inline]
    pub fn physical_slot(&self, logical: u64) -> usize {
        (logical % self.capacity) as usize
    }

    /// Oldest logical position still present when `write_counter` is newest.
    #[inline]
    pub fn oldest_logical(&self, write_counter: u64) -> u64 {
        (write_counter + 1).saturating_sub(self.capacity)
    }

    pub fn is_retained(&self, write_counter: u64, logical: u64) -> bool {
        logical <= write_counter && logical >= self.oldest_logical(write_counter)
    }

    /// Writes at `logical`. Positions must be written in order starting at 0.
    pub fn write(&mut self, logical: u64, observation: DerivedObservation) {
        let slot = self.physical_slot(logical);
        if slot == self.slots.len() {
            self.slots.push(observation);
        } else {
            debug_assert!(slot < self.slots.len(), "logical {} written out of order", logical);
            self.slots[slot] = observation;
        }
    }

    /// Entry at `logical` without a retention check.
    ///
    /// Callers must have checked `is_retained` against the live write counter.
    #[inline]
    pub fn at(&self, logical: u64) -> DerivedObservation {
        self.slots[self.physical_slot(logical)]
    }

    pub fn get(&self, write_counter: u64, logical: u64) -> Option<DerivedObservation> {
        self.is_retained(write_counter, logical)
            .then(|| self.at(logical))
    }

    /// Retained entries from oldest to newest, paired with their logical position.
    pub fn retained(
        &self,
        write_counter: u64,
    ) -> impl Iterator<Item = (u64, DerivedObservation)> + '_ {
        (self.oldest_logical(write_counter)..=write_counter).map(move |i| (i, self.at(i)))
    }
}
