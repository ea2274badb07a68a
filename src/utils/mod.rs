//! Utilities shared by the storage layer.

pub mod metrics;

pub use metrics::{get_stats, record_operation, reset_stats, IoStats, Operation};
