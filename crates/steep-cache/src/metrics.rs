//! Cache hit/miss counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one cache instance.
///
/// Cold and expired misses are tracked separately; both behave as
/// misses to callers, the split only matters here.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    cold_misses: AtomicU64,
    expired_misses: AtomicU64,
    writes: AtomicU64,
    stale_rejects: AtomicU64,
    invalidations: AtomicU64,
}

impl CacheMetrics {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cold_miss(&self) {
        self.cold_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired_miss(&self) {
        self.expired_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_reject(&self) {
        self.stale_rejects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the current counter values.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            cold_misses: self.cold_misses.load(Ordering::Relaxed),
            expired_misses: self.expired_misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            stale_rejects: self.stale_rejects.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheMetricsSnapshot {
    /// Fresh reads served from the cache.
    pub hits: u64,
    /// Misses on never-populated keys.
    pub cold_misses: u64,
    /// Misses on keys whose entry had lapsed.
    pub expired_misses: u64,
    /// Entries written.
    pub writes: u64,
    /// Writes rejected by the sequence guard.
    pub stale_rejects: u64,
    /// Entries explicitly invalidated.
    pub invalidations: u64,
}

impl CacheMetricsSnapshot {
    /// Total misses, regardless of reason.
    pub fn misses(&self) -> u64 {
        self.cold_misses + self.expired_misses
    }

    /// Fraction of reads served from the cache; 0.0 when no reads
    /// happened.
    pub fn hit_rate(&self) -> f64 {
        let reads = self.hits + self.misses();
        if reads == 0 {
            return 0.0;
        }
        self.hits as f64 / reads as f64
    }
}
