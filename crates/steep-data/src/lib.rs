//! Cache-first fetch coordination for the Steep storefront.
//!
//! This crate sits between the UI layer and the network layer. For
//! each resource class it wraps the single outbound query with
//! cache-first semantics:
//!
//! 1. Canonicalize the request into a cache key.
//! 2. Serve a fresh cached payload without touching the network.
//! 3. On a miss, issue one network call per key no matter how many
//!    callers are waiting (single-flight), write the result back under
//!    an issuance-order guard, and propagate failures without caching
//!    them.
//!
//! Aborted calls never write to the cache and never surface as
//! user-visible errors. Optimistic local mutations snapshot the prior
//! entry so a failed confirmation can roll them back.

mod coordinator;
mod error;
mod optimistic;
mod request;
mod source;

pub use coordinator::FetchCoordinator;
pub use error::FetchError;
pub use optimistic::OptimisticUpdate;
pub use request::{DataSource, QueryOutcome, QueryState, RequestPhase};
pub use source::{ApiEnvelope, QueryRequest, QuerySource};
