//! Process-wide I/O metrics for database files.
//!
//! Every successful save and load is recorded; counters are relaxed atomics
//! and may be read while other threads update them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Operation types for metrics tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Write a database file.
    Save,

    /// Read a database file.
    Load,
}

/// Snapshot of the I/O counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IoStats {
    /// Number of completed saves.
    pub save_count: u64,

    /// Number of completed loads.
    pub load_count: u64,

    /// Total bytes written by saves.
    pub bytes_written: u64,

    /// Total bytes read by loads.
    pub bytes_read: u64,

    /// Average save time in microseconds.
    pub avg_save_time_us: u64,

    /// Average load time in microseconds.
    pub avg_load_time_us: u64,
}

static SAVE_COUNT: AtomicU64 = AtomicU64::new(0);
static LOAD_COUNT: AtomicU64 = AtomicU64::new(0);
static BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static BYTES_READ: AtomicU64 = AtomicU64::new(0);
static TOTAL_SAVE_TIME_US: AtomicU64 = AtomicU64::new(0);
static TOTAL_LOAD_TIME_US: AtomicU64 = AtomicU64::new(0);

/// Record a completed operation.
#[inline]
pub fn record_operation(op: Operation, bytes: usize, duration: Duration) {
    let duration_us = duration.as_micros() as u64;

    match op {
        Operation::Save => {
            SAVE_COUNT.fetch_add(1, Ordering::Relaxed);
            BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
            TOTAL_SAVE_TIME_US.fetch_add(duration_us, Ordering::Relaxed);
        }
        Operation::Load => {
            LOAD_COUNT.fetch_add(1, Ordering::Relaxed);
            BYTES_READ.fetch_add(bytes as u64, Ordering::Relaxed);
            TOTAL_LOAD_TIME_US.fetch_add(duration_us, Ordering::Relaxed);
        }
    }
}

/// Get the current statistics.
pub fn get_stats() -> IoStats {
    let save_count = SAVE_COUNT.load(Ordering::Relaxed);
    let load_count = LOAD_COUNT.load(Ordering::Relaxed);

    let avg_save_time_us = if save_count > 0 {
        TOTAL_SAVE_TIME_US.load(Ordering::Relaxed) / save_count
    } else {
        0
    };

    let avg_load_time_us = if load_count > 0 {
        TOTAL_LOAD_TIME_US.load(Ordering::Relaxed) / load_count
    } else {
        0
    };

    IoStats {
        save_count,
        load_count,
        bytes_written: BYTES_WRITTEN.load(Ordering::Relaxed),
        bytes_read: BYTES_READ.load(Ordering::Relaxed),
        avg_save_time_us,
        avg_load_time_us,
    }
}

/// Reset all statistics to zero.
pub fn reset_stats() {
    SAVE_COUNT.store(0, Ordering::Relaxed);
    LOAD_COUNT.store(0, Ordering::Relaxed);
    BYTES_WRITTEN.store(0, Ordering::Relaxed);
    BYTES_READ.store(0, Ordering::Relaxed);
    TOTAL_SAVE_TIME_US.store(0, Ordering::Relaxed);
    TOTAL_LOAD_TIME_US.store(0, Ordering::Relaxed);
}

/// Run `f`, recording it as `op` of `bytes` bytes when it succeeds.
///
/// `bytes` is computed from the successful result.
pub(crate) fn measure<T, E>(
    op: Operation,
    f: impl FnOnce() -> Result<T, E>,
    bytes: impl FnOnce(&T) -> usize,
) -> Result<T, E> {
    let start = Instant::now();
    let value = f()?;
    record_operation(op, bytes(&value), start.elapsed());
    Ok(value)
}
