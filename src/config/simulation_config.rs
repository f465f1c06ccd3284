use crate::config::{parse_list_or, parse_or};
use anyhow::Result;

/// Settings for the simulated sources the headless server feeds itself with.
#[derive(Debug, Clone)]
pub struct SimulationEnvConfig {
    pub source_ids: Vec<String>,
    /// Largest tick move per second.
    pub tick_volatility: i64,
    pub initial_tick: i64,
    /// Ring size of each simulated source.
    pub capacity: u64,
}

impl SimulationEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let source_ids = parse_list_or(lookup, "SIMULATION_SOURCES", vec!["ETH/USDC".to_string()])?;

        let tick_volatility = parse_or(lookup, "SIMULATION_TICK_VOLATILITY", 25)?; // Default 25 ticks/s

        let initial_tick = parse_or(lookup, "SIMULATION_INITIAL_TICK", 200_000)?;

        let capacity = parse_or(lookup, "SIMULATION_CAPACITY", 65_535)?;

        Ok(Self {
            source_ids,
            tick_volatility,
            initial_tick,
            capacity,
        })
    }
}
