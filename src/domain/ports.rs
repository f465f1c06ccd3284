use crate::domain::observation::SourceObservation;

/// Read-only view of an external ring of cumulative tick samples.
///
/// Implementations must return a consistent snapshot for the duration of a
/// single oracle call; the oracle never writes through this trait.
pub trait ObservationSource: Send + Sync {
    /// Stable identifier used as the registry key.
    fn source_id(&self) -> &str;

    /// Physical slot of the most recently written sample.
    fn current_index(&self) -> u64;

    /// Number of physical slots in the ring.
    fn capacity(&self) -> u64;

    /// Sample at a physical slot. Never-written slots are uninitialized.
    fn observation_at(&self, index: u64) -> SourceObservation;
}

/// Wall clock in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}
