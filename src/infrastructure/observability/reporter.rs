//! Push-based volatility reporter
//!
//! Periodically outputs each tracked source's checkpoint and realized
//! variance over a set of look-back windows as structured JSON on stdout.

use crate::application::vol_oracle::VolOracle;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

/// Snapshot for JSON output
#[derive(Debug, Serialize)]
pub struct VolSnapshot {
    pub timestamp: String,
    pub uptime_seconds: u64,
    pub version: String,
    pub sources: Vec<SourceVolSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct SourceVolSnapshot {
    pub source_id: String,
    pub write_counter: u64,
    pub last_checked_source_index: u64,
    pub last_timestamp: i64,
    pub windows: Vec<WindowVol>,
}

/// Variance over the last `hours`; `None` when the window cannot be
/// measured yet (or any more), with the reason in `error`.
#[derive(Debug, Serialize)]
pub struct WindowVol {
    pub hours: u32,
    pub variance: Option<i128>,
    pub error: Option<String>,
}

pub struct VolReporter {
    oracle: Arc<VolOracle>,
    window_hours: Vec<u32>,
    start_time: Instant,
    interval: Duration,
}

impl VolReporter {
    /// # Arguments
    /// * `oracle` - Shared oracle registry
    /// * `window_hours` - Look-back windows to report, in hours
    /// * `interval_seconds` - How often to output a snapshot
    pub fn new(oracle: Arc<VolOracle>, window_hours: Vec<u32>, interval_seconds: u64) -> Self {
        Self {
            oracle,
            window_hours,
            start_time: Instant::now(),
            interval: Duration::from_secs(interval_seconds.max(1)),
        }
    }

    pub fn collect_snapshot(&self) -> VolSnapshot {
        let sources = self
            .oracle
            .sources()
            .into_iter()
            .map(|source_id| {
                let state = self.oracle.get_oracle_state(&source_id);
                let windows = self
                    .window_hours
                    .iter()
                    .map(|&hours| match self.oracle.calculate_vol_by_hours(&source_id, hours) {
                        Ok(variance) => WindowVol {
                            hours,
                            variance: Some(variance),
                            error: None,
                        },
                        Err(e) => WindowVol {
                            hours,
                            variance: None,
                            error: Some(e.to_string()),
                        },
                    })
                    .collect();

                SourceVolSnapshot {
                    source_id,
                    write_counter: state.write_counter,
                    last_checked_source_index: state.last_checked_source_index,
                    last_timestamp: state.last_timestamp,
                    windows,
                }
            })
            .collect();

        VolSnapshot {
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sources,
        }
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "VolReporter: Starting push-based reports (interval: {:?}, windows: {:?}h)",
            self.interval, self.window_hours
        );

        let mut interval = tokio::time::interval(self.interval);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = self.collect_snapshot();
                    match serde_json::to_string(&snapshot) {
                        Ok(json) => {
                            // Prefixed so logs can be easily filtered
                            println!("VOL_JSON:{}", json);
                            info!(
                                "Sources: {} | Uptime: {}s",
                                snapshot.sources.len(),
                                snapshot.uptime_seconds
                            );
                        }
                        Err(e) => warn!("Failed to serialize vol snapshot: {}", e),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::oracle::OracleConfig;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::in_memory_source::InMemoryObservationSource;

    #[test]
    fn test_snapshot_collection() {
        let clock = Arc::new(ManualClock::new(0));
        let oracle = Arc::new(VolOracle::with_clock(
            OracleConfig::new(64, 8, 10).unwrap(),
            clock.clone(),
        ));
        let source = InMemoryObservationSource::new("ETH/USDC", 8);
        source.record(0, 0);
        oracle.init_pool(&source).unwrap();
        source.record(3_600, 5);
        source.record(7_200, 5);
        oracle.fill_in_observations(&source).unwrap();
        clock.set(7_200);

        let reporter = VolReporter::new(oracle, vec![1, 24], 60);
        let snapshot = reporter.collect_snapshot();

        assert_eq!(snapshot.sources.len(), 1);
        let source = &snapshot.sources[0];
        assert_eq!(source.write_counter, 2);
        assert_eq!(source.windows[0].variance, Some(0));
        assert!(source.windows[1].variance.is_none());
        assert!(source.windows[1].error.as_deref().unwrap_or("").contains("older"));
    }

    #[test]
    fn test_snapshot_serialization() {
        let snapshot = VolSnapshot {
            timestamp: "2026-01-10T10:00:00Z".to_string(),
            uptime_seconds: 3600,
            version: "0.3.1".to_string(),
            sources: vec![SourceVolSnapshot {
                source_id: "ETH/USDC".to_string(),
                write_counter: 42,
                last_checked_source_index: 77,
                last_timestamp: 1_666_964_989,
                windows: vec![WindowVol {
                    hours: 24,
                    variance: Some(9),
                    error: None,
                }],
            }],
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"source_id\":\"ETH/USDC\""));
        assert!(json.contains("\"variance\":9"));
    }
}
