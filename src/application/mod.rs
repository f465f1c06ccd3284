// Process-wide oracle registry
pub mod vol_oracle;

// Periodic catch-up driver
pub mod backfill_keeper;

pub use backfill_keeper::{BackfillKeeper, KeeperRound};
pub use vol_oracle::VolOracle;
