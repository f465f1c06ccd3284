pub mod clock;
pub mod in_memory_source;
pub mod observability;
pub mod simulation;
pub mod snapshot_persistence;

pub use clock::{ManualClock, SystemClock};
pub use in_memory_source::InMemoryObservationSource;
pub use snapshot_persistence::SnapshotStore;
