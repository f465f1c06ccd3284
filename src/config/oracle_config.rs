//! Oracle constants parsed from environment variables.

use crate::config::parse_or;
use crate::domain::oracle::config::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_MAX_FILL, DEFAULT_SOURCE_CAPACITY, OracleConfig,
};
use anyhow::{Context, Result};

/// Oracle environment configuration
#[derive(Debug, Clone)]
pub struct OracleEnvConfig {
    pub buffer_capacity: u64,
    pub source_capacity: u64,
    pub max_fill: u64,
}

impl OracleEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            buffer_capacity: parse_or(lookup, "VOL_ORACLE_BUFFER_CAPACITY", DEFAULT_BUFFER_CAPACITY)?,
            source_capacity: parse_or(lookup, "VOL_ORACLE_SOURCE_CAPACITY", DEFAULT_SOURCE_CAPACITY)?,
            max_fill: parse_or(lookup, "VOL_ORACLE_MAX_FILL", DEFAULT_MAX_FILL)?,
        })
    }

    pub fn to_oracle_config(&self) -> Result<OracleConfig> {
        OracleConfig::new(self.buffer_capacity, self.source_capacity, self.max_fill)
            .context("Invalid oracle configuration")
    }
}
