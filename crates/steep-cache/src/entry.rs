//! Cache entry type.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use steep_core::Timestamp;

/// A cached payload with write and expiry timestamps.
///
/// `seq` is the issuance sequence number of the request that produced
/// the payload; writes carrying an older sequence than the stored entry
/// are rejected by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry<T> {
    /// The cached payload.
    pub payload: T,
    /// When the entry was written (Unix millis).
    pub written_at: Timestamp,
    /// When the entry stops being fresh (Unix millis).
    pub expires_at: Timestamp,
    /// Issuance sequence number of the producing request.
    pub seq: u64,
}

impl<T> CacheEntry<T> {
    /// Create an entry written at `now`, fresh for `ttl`.
    pub fn new(payload: T, now: Timestamp, ttl: Duration, seq: u64) -> Self {
        Self {
            payload,
            written_at: now,
            expires_at: now.saturating_add(ttl.as_millis() as i64),
            seq,
        }
    }

    /// Check if the entry has lapsed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Age of the entry at `now`.
    pub fn age(&self, now: Timestamp) -> Duration {
        Duration::from_millis(now.saturating_sub(self.written_at).max(0) as u64)
    }

    /// Remaining freshness at `now`; zero once expired.
    pub fn remaining_ttl(&self, now: Timestamp) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(now).max(0) as u64)
    }
}
