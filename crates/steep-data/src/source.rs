//! The downstream query interface implemented by the network layer.

use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use steep_cache::{QueryKey, QueryKeyBuilder, ResourceClass};

/// Wire envelope returned by the storefront API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    /// Whether the server processed the request.
    pub success: bool,
    /// The response payload.
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    /// Create a successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A parameterized read request for one resource class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    class: ResourceClass,
    params: BTreeMap<String, String>,
}

impl QueryRequest {
    /// Start a request for the given resource class.
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

    /// The resource class this request reads.
    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// The request parameters, in canonical order.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Canonical cache key for this request.
    ///
    /// Semantically identical requests map to the same key regardless
    /// of the order parameters were supplied in.
    pub fn cache_key(&self) -> QueryKey {
        QueryKeyBuilder::new(self.class)
            .params(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .build()
    }
}

/// Downstream read interface implemented by the network/API layer.
///
/// Timeouts and retries are this layer's concern; the coordinator
/// imposes neither.
#[async_trait]
pub trait QuerySource<T>: Send + Sync {
    /// Perform the network read for `request`.
    async fn fetch(&self, request: &QueryRequest) -> Result<ApiEnvelope<T>, FetchError>;
}
