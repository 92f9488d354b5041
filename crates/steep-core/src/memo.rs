//! Explicit memoization for derived values.

/// A single-slot cache for the result of a pure derivation.
///
/// The slot is keyed by the identity of the derivation's declared
/// inputs: `get_or_compute` recomputes only when the key differs from
/// the one stored alongside the cached value. Hit and recompute
/// counters expose the memoization policy to tests.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    hits: u64,
    recomputes: u64,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            slot: None,
            hits: 0,
            recomputes: 0,
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: PartialEq,
    V: Clone,
{
    /// Create an empty memo slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it only if the key
    /// changed since the last call.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some((cached_key, cached_value)) = &self.slot {
            if *cached_key == key {
                self.hits += 1;
                return cached_value.clone();
            }
        }

        let value = compute();
        self.slot = Some((key, value.clone()));
        self.recomputes += 1;
        value
    }

    /// Look at the cached value without recomputing.
    pub fn peek(&self) -> Option<&V> {
        self.slot.as_ref().map(|(_, v)| v)
    }

    /// Drop the cached value, forcing the next call to recompute.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// Number of calls served from the cached slot.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of calls that ran the derivation.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }
}
