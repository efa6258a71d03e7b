//! Process-wide conversion statistics.
//!
//! Counters are atomics so concurrent file completions from any number of
//! jobs never lose an update.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bytes per reported megabyte.
const BYTES_PER_MB: f64 = 1e6;

/// Orchestrator-scoped conversion counters.
#[derive(Debug)]
pub struct Statistics {
    /// When the orchestrator was created.
    initialized_at: DateTime<Utc>,
    /// Files converted successfully.
    files_converted: AtomicU64,
    /// Bytes of input converted successfully.
    bytes_converted: AtomicU64,
}

impl Statistics {
    /// Create zeroed counters stamped with the current time.
    pub fn new() -> Self {
        Self {
            initialized_at: Utc::now(),
            files_converted: AtomicU64::new(0),
            bytes_converted: AtomicU64::new(0),
        }
    }

    /// Record one converted file of the given input size.
    pub fn record_file(&self, size_bytes: u64) {
        self.files_converted.fetch_add(1, Ordering::Relaxed);
        self.bytes_converted.fetch_add(size_bytes, Ordering::Relaxed);
    }

    /// Get the current snapshot of the counters.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        StatisticsSnapshot {
            initialized_at: self.initialized_at,
            files_converted: self.files_converted.load(Ordering::Relaxed),
            data_converted_mb: self.bytes_converted.load(Ordering::Relaxed) as f64 / BYTES_PER_MB,
        }
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of [`Statistics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    /// When the orchestrator was created.
    pub initialized_at: DateTime<Utc>,
    /// Files converted successfully.
    pub files_converted: u64,
    /// Megabytes (10^6 bytes) of input converted successfully.
    #[serde(rename = "dataConvertedMB")]
    pub data_converted_mb: f64,
}
