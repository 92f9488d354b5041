//! The keyed query-result store.

use crate::entry::CacheEntry;
use crate::key::QueryKey;
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::policy::ResourceClass;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use steep_core::SharedClock;

/// Why a read missed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    /// The key was never populated.
    Cold,
    /// An entry existed but its freshness window had lapsed.
    Expired,
}

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// Fresh entry found.
    Hit(T),
    /// No fresh entry; both reasons are misses to the caller.
    Miss(MissReason),
}

impl<T> Lookup<T> {
    /// Check if this is a hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    /// The payload, if this was a hit.
    pub fn into_payload(self) -> Option<T> {
        match self {
            Self::Hit(payload) => Some(payload),
            Self::Miss(_) => None,
        }
    }
}

/// Keyed cache of server query results with per-entry expiration.
///
/// One instance serves one resource class; dropping or clearing the
/// instance is the namespace-wide invalidation. Entries are evicted
/// lazily when a read finds them expired; there is no background
/// sweep. Writes are last-write-wins except through `write_if_newer`,
/// which rejects responses that were issued before the one already
/// stored.
///
/// The cache is session-local state and is never persisted.
pub struct QueryCache<T> {
    class: ResourceClass,
    entries: Mutex<HashMap<QueryKey, CacheEntry<T>>>,
    clock: SharedClock,
    metrics: CacheMetrics,
    next_seq: AtomicU64,
}

impl<T: Clone> QueryCache<T> {
    /// Create an empty cache for one resource class.
    pub fn new(class: ResourceClass, clock: SharedClock) -> Self {
        Self {
            class,
            entries: Mutex::new(HashMap::new()),
            clock,
            metrics: CacheMetrics::default(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// The resource class this cache serves.
    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// Draw the next issuance sequence number.
    ///
    /// Coordinators call this when a request is issued, so that a slow
    /// response can be recognized as stale by `write_if_newer` no
    /// matter when it completes.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read the payload for `key`.
    ///
    /// An entry past its freshness window behaves exactly like a
    /// missing one and is dropped on the spot.
    pub fn read(&self, key: &QueryKey) -> Lookup<T> {
        let now = self.clock.now();
        let mut entries = self.lock_entries();

        match entries.get(key) {
            None => {
                self.metrics.record_cold_miss();
                Lookup::Miss(MissReason::Cold)
            }
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                self.metrics.record_expired_miss();
                tracing::trace!(cache = %self.class, %key, "evicted expired entry on read");
                Lookup::Miss(MissReason::Expired)
            }
            Some(entry) => {
                self.metrics.record_hit();
                Lookup::Hit(entry.payload.clone())
            }
        }
    }

    /// Unconditionally overwrite the entry for `key`.
    ///
    /// Manual writes draw a fresh sequence number, so they always win
    /// over responses still in flight.
    pub fn write(&self, key: &QueryKey, payload: T, ttl: Duration) {
        let seq = self.next_seq();
        let now = self.clock.now();
        self.lock_entries()
            .insert(key.clone(), CacheEntry::new(payload, now, ttl, seq));
        self.metrics.record_write();
        tracing::debug!(cache = %self.class, %key, ttl_secs = ttl.as_secs(), "cache write");
    }

    /// Write the entry for `key` unless a newer response already
    /// landed there.
    ///
    /// `seq` must come from `next_seq`, drawn when the producing
    /// request was issued. Returns false when the write was rejected.
    pub fn write_if_newer(&self, key: &QueryKey, payload: T, ttl: Duration, seq: u64) -> bool {
        let now = self.clock.now();
        let mut entries = self.lock_entries();

        if let Some(existing) = entries.get(key) {
            if existing.seq > seq {
                drop(entries);
                self.metrics.record_stale_reject();
                tracing::debug!(
                    cache = %self.class,
                    %key,
                    seq,
                    "rejected write from superseded request"
                );
                return false;
            }
        }

        entries.insert(key.clone(), CacheEntry::new(payload, now, ttl, seq));
        drop(entries);
        self.metrics.record_write();
        true
    }

    /// Drop the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let removed = self.lock_entries().remove(key).is_some();
        if removed {
            self.metrics.record_invalidation();
            tracing::debug!(cache = %self.class, %key, "invalidated entry");
        }
        removed
    }

    /// Drop every entry in this namespace.
    pub fn clear(&self) {
        let mut entries = self.lock_entries();
        let dropped = entries.len();
        entries.clear();
        drop(entries);
        if dropped > 0 {
            self.metrics.record_invalidation();
            tracing::debug!(cache = %self.class, dropped, "cleared namespace");
        }
    }

    /// Number of stored entries, including ones not yet lazily
    /// evicted.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Check if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    /// Copy of the raw entry for `key`, fresh or not. Supports
    /// snapshot-before-mutate flows.
    pub fn entry_snapshot(&self, key: &QueryKey) -> Option<CacheEntry<T>> {
        self.lock_entries().get(key).cloned()
    }

    /// Put back a previously-snapshotted entry; `None` removes the
    /// current one.
    pub fn restore(&self, key: &QueryKey, prior: Option<CacheEntry<T>>) {
        let mut entries = self.lock_entries();
        match prior {
            Some(entry) => {
                entries.insert(key.clone(), entry);
            }
            None => {
                entries.remove(key);
            }
        }
    }

    /// Edit the payload of the entry for `key` in place, keeping its
    /// expiry and sequence number. Returns false when no entry exists.
    pub fn mutate_payload(&self, key: &QueryKey, mutate: impl FnOnce(&mut T)) -> bool {
        let mut entries = self.lock_entries();
        match entries.get_mut(key) {
            Some(entry) => {
                mutate(&mut entry.payload);
                true
            }
            None => false,
        }
    }

    /// Snapshot of this cache's counters.
    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.metrics.snapshot()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}
