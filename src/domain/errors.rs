use thiserror::Error;

/// Errors raised by the volatility oracle.
///
/// Every variant is a synchronous rejection: the call that produced it left
/// the oracle state exactly as it found it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("Source {source_id} is already initialized")]
    AlreadyInitialized { source_id: String },

    #[error("Source {source_id} has not been initialized")]
    NotInitialized { source_id: String },

    #[error("Source {source_id} capacity too small: {actual} < required {required}")]
    InsufficientSourceCapacity {
        source_id: String,
        required: u64,
        actual: u64,
    },

    #[error("Target {target} is older than the oldest retained observation at {oldest}")]
    TargetTooOld { target: i64, oldest: i64 },

    #[error("No observations newer than target {target} (newest at {newest})")]
    NoNewObservations { target: i64, newest: i64 },

    #[error("Source {source_id} slot {index} holds no observation")]
    UninitializedSourceObservation { source_id: String, index: u64 },

    #[error("Source {source_id} slot {index}: timestamp {current} does not advance past {previous}")]
    NonIncreasingTimestamp {
        source_id: String,
        index: u64,
        previous: i64,
        current: i64,
    },

    #[error("Observation {index} is not retained (window {oldest}..={newest})")]
    ObservationNotRetained { index: u64, oldest: u64, newest: u64 },

    #[error("Snapshot for {source_id} does not match oracle config: {reason}")]
    SnapshotMismatch { source_id: String, reason: String },
}

impl OracleError {
    /// Conditions a caller hits during normal catch-up and can resolve by
    /// waiting or picking another target.
    pub fn is_operational(&self) -> bool {
        matches!(self, OracleError::NoNewObservations { .. })
    }
}
