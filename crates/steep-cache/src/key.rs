//! Canonical cache key composition.

use crate::policy::ResourceClass;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A canonical cache key uniquely identifying a server query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey(String);

impl QueryKey {
    /// Create a cache key from an already-canonical string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Builder that canonicalizes query parameters into a stable key.
///
/// Parameters are held in a `BTreeMap`, so semantically identical
/// queries hit the same cache slot regardless of the order the call
/// site supplied arguments in.
#[derive(Debug, Clone)]
pub struct QueryKeyBuilder {
    class: ResourceClass,
    params: BTreeMap<String, String>,
}

impl QueryKeyBuilder {
    /// Start a key for the given resource class.
    pub fn new(class: ResourceClass) -> Self {
        Self {
            class,
            params: BTreeMap::new(),
        }
    }

    /// Add a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Add multiple query parameters.
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in params {
            self.params.insert(name.into(), value.to_string());
        }
        self
    }

    /// Build the canonical key, e.g. `listing?category=green-tea&page=1`.
    pub fn build(&self) -> QueryKey {
        if self.params.is_empty() {
            return QueryKey::new(self.class.name());
        }

        let query: Vec<String> = self
            .params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        QueryKey::new(format!("{}?{}", self.class.name(), query.join("&")))
    }
}
