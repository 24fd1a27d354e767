//! Refresh Statistics Module
//!
//! Tracks refresh outcomes for a snapshot cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Refresh Stats ==
/// Tracks refresh outcomes of one cache.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStats {
    /// Number of fetches that installed a new snapshot
    pub refreshes: u64,
    /// Number of fetches that failed
    pub failures: u64,
    /// Number of refresh requests collapsed into an in-flight fetch
    pub skipped: u64,
    /// When the current snapshot was installed
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

impl RefreshStats {
    // == Constructor ==
    /// Creates a new RefreshStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Failure Rate ==
    /// Returns failures / (refreshes + failures), or 0.0 if nothing was fetched yet.
    pub fn failure_rate(&self) -> f64 {
        let total = self.refreshes + self.failures;
        if total == 0 {
            0.0
        } else {
            self.failures as f64 / total as f64
        }
    }

    // == Record Refresh ==
    /// Counts a successful fetch and stamps the install time.
    pub fn record_refresh(&mut self) {
        self.refreshes += 1;
        self.last_refreshed_at = Some(Utc::now());
    }

    // == Record Failure ==
    /// Increments the failure counter.
    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    // == Record Skip ==
    /// Increments the skipped counter.
    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }
}
