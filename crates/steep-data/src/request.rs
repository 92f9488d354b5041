//! Request lifecycle and the UI-facing result shapes.

use crate::error::FetchError;
use serde::Serialize;

/// Lifecycle of one outbound query.
///
/// A request starts `Idle`, becomes `Pending` while a network call is
/// in flight, and ends `Fulfilled` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPhase {
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Where a query result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Served from the query cache without a network call.
    Cache,
    /// Fetched from the network on this call.
    Network,
}

/// A successful coordinated read.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<T> {
    /// The payload.
    pub payload: T,
    /// Whether the payload came from the cache or the network.
    pub source: DataSource,
}

impl<T> QueryOutcome<T> {
    /// Check if the payload was served from the cache.
    pub fn is_from_cache(&self) -> bool {
        self.source == DataSource::Cache
    }
}

/// Snapshot of a query handed to the UI layer.
///
/// Cancellations never populate `error`: an aborted call leaves the
/// state empty and settled, matching a request that was never issued.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    /// The payload, once available.
    pub payload: Option<T>,
    /// Whether a call is still in flight.
    pub is_loading: bool,
    /// Whether the payload was served from the cache.
    pub is_from_cache: bool,
    /// The failure, if the call failed for a reason worth showing.
    pub error: Option<FetchError>,
}

impl<T> QueryState<T> {
    /// State for a request still in flight.
    pub fn loading() -> Self {
        Self {
            payload: None,
            is_loading: true,
            is_from_cache: false,
            error: None,
        }
    }

    /// State for a completed request.
    pub fn ready(payload: T, source: DataSource) -> Self {
        Self {
            payload: Some(payload),
            is_loading: false,
            is_from_cache: source == DataSource::Cache,
            error: None,
        }
    }

    /// State for a failed request. Cancellations are suppressed.
    pub fn failed(error: FetchError) -> Self {
        let error = (!error.is_cancellation()).then_some(error);
        Self {
            payload: None,
            is_loading: false,
            is_from_cache: false,
            error,
        }
    }

    /// Check if a payload is available.
    pub fn is_ready(&self) -> bool {
        self.payload.is_some()
    }
}
