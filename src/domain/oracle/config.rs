use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};

/// Four days of per-second samples.
pub const DEFAULT_BUFFER_CAPACITY: u64 = 345_600;
/// Largest ring cardinality the source can be grown to.
pub const DEFAULT_SOURCE_CAPACITY: u64 = 65_535;
pub const DEFAULT_MAX_FILL: u64 = 100;

pub const SECONDS_PER_HOUR: i64 = 3_600;
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Constants fixed for the lifetime of an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Slots in each derived observation buffer.
    pub buffer_capacity: u64,
    /// Minimum ring size a source must report to be tracked.
    pub source_capacity: u64,
    /// Upper bound on source entries consumed per backfill call.
    pub max_fill: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            source_capacity: DEFAULT_SOURCE_CAPACITY,
            max_fill: DEFAULT_MAX_FILL,
        }
    }
}

impl OracleConfig {
    pub fn new(buffer_capacity: u64, source_capacity: u64, max_fill: u64) -> Result<Self> {
        let config = Self {
            buffer_capacity,
            source_capacity,
            max_fill,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.buffer_capacity > 0, "buffer_capacity must be positive");
        ensure!(self.source_capacity > 0, "source_capacity must be positive");
        ensure!(self.max_fill > 0, "max_fill must be positive");
        Ok(())
    }

    pub fn with_max_fill(mut self, max_fill: u64) -> Self {
        self.max_fill = max_fill;
        self
    }
}
