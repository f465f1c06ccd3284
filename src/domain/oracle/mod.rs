//! Derived observation buffer and the algorithms that maintain and query it.

pub mod backfill;
pub mod buffer;
pub mod config;
pub mod pool;
pub mod range;
pub mod search;
pub mod volatility;

pub use buffer::ObservationBuffer;
pub use config::OracleConfig;
pub use pool::{FillReport, OracleSnapshot, PoolOracle};
pub use range::IndexRange;
