//! Configuration module for the volatility oracle.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Oracle, Keeper, Observability and Simulation.
//!
//! Every sub-config parses through a lookup closure; `from_env` plugs in the
//! process environment, tests plug in a map.

mod keeper_config;
mod observability_config;
mod oracle_config;
mod simulation_config;

pub use keeper_config::KeeperEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use oracle_config::OracleEnvConfig;
pub use simulation_config::SimulationEnvConfig;

use crate::domain::oracle::OracleConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Parses `key` when present, otherwise returns `default`.
pub(crate) fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: {}", key, raw)),
        None => Ok(default),
    }
}

/// Parses a comma-separated list; blank items are skipped.
pub(crate) fn parse_list_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Vec<T>,
) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| {
                item.parse::<T>()
                    .with_context(|| format!("Invalid {} entry: {}", key, item))
            })
            .collect(),
        None => Ok(default),
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub oracle: OracleConfig,
    pub keeper: KeeperEnvConfig,
    pub observability: ObservabilityEnvConfig,
    pub simulation: SimulationEnvConfig,
    pub snapshot_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let oracle = OracleEnvConfig::from_lookup(lookup)
            .context("Failed to load oracle config")?
            .to_oracle_config()?;
        let keeper = KeeperEnvConfig::from_lookup(lookup).context("Failed to load keeper config")?;
        let observability = ObservabilityEnvConfig::from_lookup(lookup)
            .context("Failed to load observability config")?;
        let simulation =
            SimulationEnvConfig::from_lookup(lookup).context("Failed to load simulation config")?;
        let snapshot_dir = lookup("SNAPSHOT_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            oracle,
            keeper,
            observability,
            simulation,
            snapshot_dir,
        })
    }
}
