//! Backfill keeper configuration parsing from environment variables.

use crate::config::parse_or;
use anyhow::Result;

/// Keeper environment configuration
#[derive(Debug, Clone)]
pub struct KeeperEnvConfig {
    pub interval_seconds: u64,
    /// Backfill batches per source per pass.
    pub max_rounds: u32,
}

impl KeeperEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            interval_seconds: parse_or(lookup, "KEEPER_INTERVAL_SECONDS", 15)?,
            max_rounds: parse_or(lookup, "KEEPER_MAX_ROUNDS", 10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeper_defaults() {
        let config = KeeperEnvConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config.interval_seconds, 15);
        assert_eq!(config.max_rounds, 10);
    }
}
