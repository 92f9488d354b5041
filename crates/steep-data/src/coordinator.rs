//! Cache-first orchestration of outbound queries.

use crate::error::FetchError;
use crate::request::{DataSource, QueryOutcome, QueryState, RequestPhase};
use crate::source::{QueryRequest, QuerySource};
use futures::future::{AbortHandle, Abortable, BoxFuture, Shared};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use steep_cache::{FreshnessPolicy, Lookup, QueryCache, QueryKey, ResourceClass};

type SharedFetch<T> = Shared<BoxFuture<'static, Result<Arc<T>, FetchError>>>;

struct InFlight<T> {
    future: SharedFetch<T>,
    abort: AbortHandle,
    seq: u64,
}

/// Coordinates the outbound query for one resource class.
///
/// Reads go to the cache first; misses issue at most one network call
/// per cache key, shared by every concurrent caller. Successful
/// responses are written back under an issuance-order guard, so a slow
/// response can never clobber a fresher entry. Failures propagate to
/// the caller and are never cached.
pub struct FetchCoordinator<T> {
    class: ResourceClass,
    cache: Arc<QueryCache<T>>,
    source: Arc<dyn QuerySource<T>>,
    ttl: Duration,
    in_flight: Arc<Mutex<HashMap<QueryKey, InFlight<T>>>>,
    settled: Arc<Mutex<HashMap<QueryKey, RequestPhase>>>,
}

impl<T> FetchCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a coordinator over a cache and a network source, using
    /// the policy's freshness window for the cache's resource class.
    pub fn new(
        cache: Arc<QueryCache<T>>,
        source: Arc<dyn QuerySource<T>>,
        policy: &FreshnessPolicy,
    ) -> Self {
        let class = cache.class();
        Self {
            class,
            cache,
            source,
            ttl: policy.ttl_for(class),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            settled: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The resource class this coordinator serves.
    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// The cache behind this coordinator.
    pub fn cache(&self) -> &Arc<QueryCache<T>> {
        &self.cache
    }

    /// Resolve a request, cache first.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryOutcome<T>, FetchError> {
        let key = request.cache_key();

        if let Lookup::Hit(payload) = self.cache.read(&key) {
            tracing::trace!(class = %self.class, %key, "served from cache");
            return Ok(QueryOutcome {
                payload,
                source: DataSource::Cache,
            });
        }

        let shared = self.join_or_issue(&key, request);
        shared.await.map(|payload| QueryOutcome {
            payload: (*payload).clone(),
            source: DataSource::Network,
        })
    }

    /// Resolve a request into the UI-facing state shape.
    pub async fn query_state(&self, request: QueryRequest) -> QueryState<T> {
        match self.query(request).await {
            Ok(outcome) => QueryState::ready(outcome.payload, outcome.source),
            Err(error) => QueryState::failed(error),
        }
    }

    /// Abort the in-flight call for `key`, if any.
    ///
    /// Every caller sharing the call observes a cancellation; nothing
    /// is written to the cache.
    pub fn abort(&self, key: &QueryKey) -> bool {
        let in_flight = lock(&self.in_flight);
        match in_flight.get(key) {
            Some(entry) => {
                entry.abort.abort();
                tracing::debug!(class = %self.class, %key, seq = entry.seq, "aborted in-flight request");
                true
            }
            None => false,
        }
    }

    /// Lifecycle phase of the request for `key`.
    pub fn phase(&self, key: &QueryKey) -> RequestPhase {
        if lock(&self.in_flight).contains_key(key) {
            return RequestPhase::Pending;
        }
        lock(&self.settled)
            .get(key)
            .copied()
            .unwrap_or(RequestPhase::Idle)
    }

    /// Number of network calls currently in flight.
    pub fn in_flight_count(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Join the in-flight call for `key`, or become its issuer.
    fn join_or_issue(&self, key: &QueryKey, request: QueryRequest) -> SharedFetch<T> {
        let mut in_flight = lock(&self.in_flight);

        if let Some(entry) = in_flight.get(key) {
            tracing::trace!(class = %self.class, %key, "joined in-flight request");
            return entry.future.clone();
        }

        // Sequence is drawn at issuance time, not completion time.
        let seq = self.cache.next_seq();
        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        let write_key = key.clone();

        let fetch = async move {
            let envelope = source.fetch(&request).await?;
            if !envelope.success {
                return Err(FetchError::Rejected(request.cache_key().to_string()));
            }
            let payload = envelope.data;
            if !cache.write_if_newer(&write_key, payload.clone(), ttl, seq) {
                tracing::debug!(%write_key, seq, "response superseded, cache left untouched");
            }
            Ok(Arc::new(payload))
        };

        let (abort, registration) = AbortHandle::new_pair();
        let registry = Arc::clone(&self.in_flight);
        let settled = Arc::clone(&self.settled);
        let cleanup_key = key.clone();
        let future = Abortable::new(fetch, registration)
            .map(move |aborted| {
                lock(&registry).remove(&cleanup_key);
                let result = match aborted {
                    Ok(inner) => inner,
                    Err(futures::future::Aborted) => Err(FetchError::Cancelled),
                };
                let phase = if result.is_ok() {
                    RequestPhase::Fulfilled
                } else {
                    RequestPhase::Rejected
                };
                lock(&settled).insert(cleanup_key.clone(), phase);
                result
            })
            .boxed()
            .shared();

        in_flight.insert(
            key.clone(),
            InFlight {
                future: future.clone(),
                abort,
                seq,
            },
        );
        future
    }
}

fn lock<K, V>(map: &Mutex<HashMap<K, V>>) -> MutexGuard<'_, HashMap<K, V>> {
    map.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ApiEnvelope;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use steep_core::ManualClock;

    /// Network stub with a controllable delay and failure mode.
    struct StubSource {
        calls: AtomicU64,
        delay: Duration,
        mode: StubMode,
    }

    #[derive(Clone, Copy)]
    enum StubMode {
        Ok,
        ConnectionError,
        RejectedEnvelope,
    }

    impl StubSource {
        fn ok() -> Self {
            Self::with_mode(StubMode::Ok)
        }

        fn with_mode(mode: StubMode) -> Self {
            Self {
                calls: AtomicU64::new(0),
                delay: Duration::ZERO,
                mode,
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::ok()
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuerySource<String> for StubSource {
        async fn fetch(&self, request: &QueryRequest) -> Result<ApiEnvelope<String>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match self.mode {
                StubMode::Ok => Ok(ApiEnvelope::ok(format!("body:{}", request.cache_key()))),
                StubMode::ConnectionError => Err(FetchError::Connection("socket closed".into())),
                StubMode::RejectedEnvelope => Ok(ApiEnvelope {
                    success: false,
                    data: String::new(),
                }),
            }
        }
    }

    fn coordinator(
        source: StubSource,
    ) -> (FetchCoordinator<String>, Arc<StubSource>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let cache = Arc::new(QueryCache::new(ResourceClass::Listing, clock.clone()));
        let source = Arc::new(source);
        let coordinator =
            FetchCoordinator::new(cache, source.clone(), &FreshnessPolicy::default());
        (coordinator, source, clock)
    }

    fn listing_request(page: u32) -> QueryRequest {
        QueryRequest::new(ResourceClass::Listing).param("page", page)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (coordinator, source, _clock) = coordinator(StubSource::ok());
        let request = listing_request(1);

        let first = coordinator.query(request.clone()).await.unwrap();
        assert_eq!(first.source, DataSource::Network);

        let second = coordinator.query(request).await.unwrap();
        assert_eq!(second.source, DataSource::Cache);
        assert_eq!(second.payload, first.payload);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_refetch() {
        let (coordinator, source, clock) = coordinator(StubSource::ok());
        let request = listing_request(1);

        coordinator.query(request.clone()).await.unwrap();
        clock.advance_secs(61); // past the listing freshness window

        let again = coordinator.query(request).await.unwrap();
        assert_eq!(again.source, DataSource::Network);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_is_not_cached() {
        let (coordinator, _source, _clock) =
            coordinator(StubSource::with_mode(StubMode::ConnectionError));
        let request = listing_request(1);
        let key = request.cache_key();

        let err = coordinator.query(request).await.unwrap_err();
        assert_eq!(err, FetchError::Connection("socket closed".into()));

        assert!(!coordinator.cache().read(&key).is_hit());
        assert!(coordinator.cache().is_empty());
        assert_eq!(coordinator.phase(&key), RequestPhase::Rejected);
    }

    #[tokio::test]
    async fn test_rejected_envelope_is_a_failure() {
        let (coordinator, _source, _clock) =
            coordinator(StubSource::with_mode(StubMode::RejectedEnvelope));
        let request = listing_request(1);

        let err = coordinator.query(request).await.unwrap_err();
        assert!(matches!(err, FetchError::Rejected(_)));
        assert!(coordinator.cache().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_identical_misses_share_one_call() {
        let (coordinator, source, _clock) =
            coordinator(StubSource::slow(Duration::from_millis(20)));
        let request = listing_request(1);

        let (a, b) = tokio::join!(
            coordinator.query(request.clone()),
            coordinator.query(request)
        );

        assert_eq!(a.unwrap().source, DataSource::Network);
        assert_eq!(b.unwrap().source, DataSource::Network);
        assert_eq!(source.calls(), 1);
        assert_eq!(coordinator.in_flight_count(), 0);
        assert_eq!(coordinator.cache().metrics().writes, 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_share_calls() {
        let (coordinator, source, _clock) =
            coordinator(StubSource::slow(Duration::from_millis(10)));

        let (a, b) = tokio::join!(
            coordinator.query(listing_request(1)),
            coordinator.query(listing_request(2))
        );

        assert_ne!(a.unwrap().payload, b.unwrap().payload);
        assert_eq!(source.calls(), 2);
        assert_eq!(coordinator.cache().metrics().writes, 2);
    }

    #[tokio::test]
    async fn test_abort_cancels_without_caching() {
        let (coordinator, source, _clock) =
            coordinator(StubSource::slow(Duration::from_millis(50)));
        let request = listing_request(1);
        let key = request.cache_key();

        let (result, aborted) = tokio::join!(coordinator.query(request), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            coordinator.abort(&key)
        });

        assert!(aborted);
        assert_eq!(result.unwrap_err(), FetchError::Cancelled);
        assert!(coordinator.cache().is_empty());
        assert_eq!(coordinator.phase(&key), RequestPhase::Rejected);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_abort_on_idle_key_is_a_noop() {
        let (coordinator, _source, _clock) = coordinator(StubSource::ok());
        assert!(!coordinator.abort(&listing_request(1).cache_key()));
    }

    #[tokio::test]
    async fn test_phase_transitions() {
        let (coordinator, _source, _clock) =
            coordinator(StubSource::slow(Duration::from_millis(20)));
        let request = listing_request(1);
        let key = request.cache_key();

        assert_eq!(coordinator.phase(&key), RequestPhase::Idle);

        let (result, observed) = tokio::join!(coordinator.query(request), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            coordinator.phase(&key)
        });

        assert_eq!(observed, RequestPhase::Pending);
        assert!(result.is_ok());
        assert_eq!(coordinator.phase(&key), RequestPhase::Fulfilled);
    }

    #[tokio::test]
    async fn test_query_state_shapes() {
        let (coordinator, _source, _clock) = coordinator(StubSource::ok());

        let state = coordinator.query_state(listing_request(1)).await;
        assert!(state.is_ready());
        assert!(!state.is_from_cache);

        let state = coordinator.query_state(listing_request(1)).await;
        assert!(state.is_from_cache);
    }
}
