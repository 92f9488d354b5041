//! Expiring query-result cache for the Steep storefront.
//!
//! This crate provides:
//! - `QueryKey` / `QueryKeyBuilder` - Canonical cache key composition
//! - `ResourceClass` / `FreshnessPolicy` - Per-resource-class TTLs
//! - `CacheEntry` - A cached payload with write/expiry timestamps
//! - `QueryCache` - The keyed store with lazy TTL eviction and
//!   sequence-guarded writes
//! - `CacheMetrics` - Hit/miss counters
//!
//! # Example
//!
//! ```ignore
//! use steep_cache::{QueryCache, QueryKeyBuilder, ResourceClass, Lookup};
//! use steep_core::system_clock;
//!
//! let cache: QueryCache<Vec<ProductSummary>> =
//!     QueryCache::new(ResourceClass::Listing, system_clock());
//!
//! let key = QueryKeyBuilder::new(ResourceClass::Listing)
//!     .param("page", 1)
//!     .param("category", "green-tea")
//!     .build();
//!
//! match cache.read(&key) {
//!     Lookup::Hit(products) => render(products),
//!     Lookup::Miss(_) => fetch_and_fill(&cache, &key),
//! }
//! ```

mod entry;
mod key;
mod metrics;
mod policy;
mod store;

pub use entry::CacheEntry;
pub use key::{QueryKey, QueryKeyBuilder};
pub use metrics::{CacheMetrics, CacheMetricsSnapshot};
pub use policy::{FreshnessPolicy, ResourceClass};
pub use store::{Lookup, MissReason, QueryCache};
