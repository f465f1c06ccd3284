// Source samples, derived entries and per-source checkpoints
pub mod observation;

// Ring buffer, backfill, search and variance
pub mod oracle;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
