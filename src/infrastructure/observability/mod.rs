//! Push-based observability for the volatility oracle
//!
//! Reports are outbound only: periodic structured JSON lines on stdout,
//! suitable for Loki, Fluentd or CloudWatch ingestion.

pub mod reporter;

pub use reporter::VolReporter;
