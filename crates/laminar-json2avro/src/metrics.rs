//! Cumulative conversion counters.
//!
//! [`ConversionStats`] is owned by a converter and updated atomically at
//! the end of every call, so a converter shared across threads keeps
//! consistent totals without locking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for a converter.
#[derive(Debug, Default)]
pub struct ConversionStats {
    /// Top-level conversions that produced a value.
    pub records_converted: AtomicU64,
    /// Top-level conversions that failed.
    pub records_failed: AtomicU64,
    /// Unmatched JSON fields dropped (not collected, not rejected).
    pub unknown_fields_dropped: AtomicU64,
    /// Undecodable date/time values omitted under the `Omit` strategy.
    pub temporal_values_omitted: AtomicU64,
}

impl ConversionStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds the outcome of one call into the totals.
    pub fn record_call(&self, succeeded: bool, unknown_dropped: u64, temporal_omitted: u64) {
        if succeeded {
            self.records_converted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.records_failed.fetch_add(1, Ordering::Relaxed);
        }
        if unknown_dropped > 0 {
            self.unknown_fields_dropped
                .fetch_add(unknown_dropped, Ordering::Relaxed);
        }
        if temporal_omitted > 0 {
            self.temporal_values_omitted
                .fetch_add(temporal_omitted, Ordering::Relaxed);
        }
    }

    /// Returns a plain copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> ConversionStatsSnapshot {
        ConversionStatsSnapshot {
            records_converted: self.records_converted.load(Ordering::Relaxed),
            records_failed: self.records_failed.load(Ordering::Relaxed),
            unknown_fields_dropped: self.unknown_fields_dropped.load(Ordering::Relaxed),
            temporal_values_omitted: self.temporal_values_omitted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`ConversionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStatsSnapshot {
    /// Top-level conversions that produced a value.
    pub records_converted: u64,
    /// Top-level conversions that failed.
    pub records_failed: u64,
    /// Unmatched JSON fields dropped.
    pub unknown_fields_dropped: u64,
    /// Date/time values omitted under the `Omit` strategy.
    pub temporal_values_omitted: u64,
}
