//! Optimistic cache mutations with snapshot rollback.

use std::sync::Arc;
use steep_cache::{CacheEntry, QueryCache, QueryKey};

/// A local mutation applied to a cached resource before the server
/// confirms it.
///
/// The prior entry is snapshotted when the mutation is applied. When
/// the confirmation call succeeds, `commit` keeps the local edit; when
/// it fails, `rollback` restores the snapshot instead of leaving the
/// cache claiming something the server refused.
///
/// ```ignore
/// let update = OptimisticUpdate::begin(cache.clone(), key.clone(), |product| {
///     product.featured = true;
/// });
/// match api.set_featured(&id, true).await {
///     Ok(_) => update.commit(),
///     Err(_) => update.rollback(),
/// }
/// ```
#[must_use = "an unresolved optimistic update leaves the cache unconfirmed; call commit or rollback"]
pub struct OptimisticUpdate<T> {
    cache: Arc<QueryCache<T>>,
    key: QueryKey,
    prior: Option<CacheEntry<T>>,
    applied: bool,
}

impl<T: Clone> OptimisticUpdate<T> {
    /// Snapshot the entry for `key` and apply `mutate` to its payload
    /// in place.
    ///
    /// When no entry exists there is nothing to mutate; the guard then
    /// reports `applied() == false` and both resolutions are no-ops.
    pub fn begin(cache: Arc<QueryCache<T>>, key: QueryKey, mutate: impl FnOnce(&mut T)) -> Self {
        let prior = cache.entry_snapshot(&key);
        let applied = cache.mutate_payload(&key, mutate);
        Self {
            cache,
            key,
            prior,
            applied,
        }
    }

    /// Check if the mutation touched an entry.
    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Keep the local mutation; the server confirmed it.
    pub fn commit(self) {
        if self.applied {
            tracing::debug!(key = %self.key, "optimistic update confirmed");
        }
    }

    /// Restore the pre-mutation snapshot; the confirmation failed.
    pub fn rollback(self) {
        let Self {
            cache,
            key,
            prior,
            applied,
        } = self;
        if !applied {
            return;
        }
        tracing::debug!(%key, "rolling back optimistic update");
        cache.restore(&key, prior);
    }
}
