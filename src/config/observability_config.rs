//! Observability configuration parsing from environment variables.
//!
//! This module handles loading the periodic volatility report settings.

use crate::config::{parse_list_or, parse_or};
use anyhow::Result;

/// Observability environment configuration
#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub window_hours: Vec<u32>,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 60,
            window_hours: vec![1, 24],
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enabled: parse_or(lookup, "OBSERVABILITY_ENABLED", defaults.enabled)?,
            interval_seconds: parse_or(lookup, "OBSERVABILITY_INTERVAL", defaults.interval_seconds)?,
            window_hours: parse_list_or(lookup, "OBSERVABILITY_WINDOW_HOURS", defaults.window_hours)?,
        })
    }
}
