// ── Single cache entry ──
//
// One entry per (endpoint, argument). The current `QueryState` lives in a
// `watch` channel so subscribers see every transition; the channel's
// receiver count doubles as the subscriber count.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use edujobs_api::ApiClient;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::endpoint::{Endpoint, EndpointRequest, TagContext};
use crate::tag::{Tag, intersects};

pub(crate) type FetchResult = Result<Arc<Value>, Arc<edujobs_api::Error>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// Identity of a cached query: endpoint name plus canonical argument JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub endpoint: String,
    pub arg: String,
}

impl CacheKey {
    pub fn new(endpoint: &str, arg: &Value) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            arg: canonical_json(arg),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.arg)
    }
}

/// JSON with object keys sorted at every level, so equal arguments
/// produce equal keys regardless of insertion order.
fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{}:{}", Value::String(k.clone()), canonical_json(&map[k])))
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        scalar => scalar.to_string(),
    }
}

/// Lock ignoring poison; every guarded value is replaced whole.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Query state ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum QueryStatus {
    #[default]
    Uninitialized,
    Pending,
    Fulfilled,
    Rejected,
}

/// What a consumer sees for one query.
///
/// `data` survives a failed refetch so views can keep showing the last
/// good value next to the error.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub status: QueryStatus,
    pub data: Option<Arc<Value>>,
    pub error: Option<Arc<edujobs_api::Error>>,
    pub is_fetching: bool,
    pub is_stale: bool,
}

impl QueryState {
    /// First load in progress: nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.is_fetching && self.data.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Rejected
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Fulfilled
    }

    /// Fresh data that can be served without a request.
    pub(crate) fn is_fresh(&self) -> bool {
        self.is_success() && !self.is_stale && self.data.is_some()
    }

    /// Decode the cached payload.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, serde_json::Error>> {
        self.data
            .as_deref()
            .map(|value| T::deserialize(value))
    }
}

// ── Entry ────────────────────────────────────────────────────────────

pub(crate) struct CacheEntry {
    key: CacheKey,
    endpoint: Arc<Endpoint>,
    arg: Value,
    request: EndpointRequest,
    client: Arc<ApiClient>,
    state: watch::Sender<QueryState>,
    tags: Mutex<Vec<Tag>>,
    /// Bumped on every invalidation.
    generation: AtomicU64,
    /// Generation of the last fetch whose result was written to `state`.
    applied: AtomicU64,
    inflight: Mutex<Option<(u64, SharedFetch)>>,
    last_used: Mutex<Instant>,
    detached: AtomicBool,
}

impl CacheEntry {
    pub(crate) fn new(
        key: CacheKey,
        endpoint: Arc<Endpoint>,
        arg: Value,
        request: EndpointRequest,
        client: Arc<ApiClient>,
    ) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        // Until the first fetch the entry is tagged from its argument alone.
        let tags = endpoint.tags(&TagContext {
            arg: &arg,
            result: None,
        });
        Self {
            key,
            endpoint,
            arg,
            request,
            client,
            state,
            tags: Mutex::new(tags),
            generation: AtomicU64::new(0),
            applied: AtomicU64::new(0),
            inflight: Mutex::new(None),
            last_used: Mutex::new(Instant::now()),
            detached: AtomicBool::new(false),
        }
    }

    pub(crate) fn key(&self) -> &CacheKey {
        &self.key
    }

    pub(crate) fn state(&self) -> QueryState {
        self.state.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<QueryState> {
        self.touch();
        self.state.subscribe()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub(crate) fn tags(&self) -> Vec<Tag> {
        lock(&self.tags).clone()
    }

    pub(crate) fn touch(&self) {
        *lock(&self.last_used) = Instant::now();
    }

    pub(crate) fn idle_for(&self) -> std::time::Duration {
        lock(&self.last_used)
            .elapsed()
    }

    pub(crate) fn is_fetching(&self) -> bool {
        lock(&self.inflight).is_some()
    }

    pub(crate) fn matches(&self, invalidated: &[Tag]) -> bool {
        intersects(&lock(&self.tags), invalidated)
    }

    /// Mark the entry stale. Any fetch already in flight now counts as outdated.
    pub(crate) fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(key = %self.key, generation, "entry invalidated");
        self.state.send_modify(|s| s.is_stale = true);
    }

    /// Clear the state seen by subscribers. Used when the entry leaves the
    /// cache on reset.
    pub(crate) fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(QueryState::default());
    }

    /// Fetch the query, joining a request already in flight for the
    /// current generation instead of issuing a second one.
    pub(crate) async fn fetch(self: &Arc<Self>) -> FetchResult {
        self.touch();
        let generation = self.generation.load(Ordering::SeqCst);

        let fut = {
            let mut slot = lock(&self.inflight);
            match slot.as_ref() {
                Some((g, fut)) if *g == generation => {
                    trace!(key = %self.key, "joining in-flight request");
                    fut.clone()
                }
                _ => {
                    let entry = Arc::clone(self);
                    let fut = async move { entry.run_fetch(generation).await }
                        .boxed()
                        .shared();
                    *slot = Some((generation, fut.clone()));
                    fut
                }
            }
        };

        fut.await
    }

    async fn run_fetch(self: Arc<Self>, generation: u64) -> FetchResult {
        // A detached entry still answers its caller but never publishes state.
        if !self.detached.load(Ordering::SeqCst) {
            self.state.send_modify(|s| {
                s.is_fetching = true;
                if s.status == QueryStatus::Uninitialized {
                    s.status = QueryStatus::Pending;
                }
            });
        }
        debug!(key = %self.key, "fetching");

        let req = &self.request;
        let result = self
            .client
            .request_with_query(&req.path, req.method, &req.query, req.body.as_ref())
            .await
            .map(Arc::new)
            .map_err(Arc::new);

        self.apply(generation, &result);

        let mut slot = lock(&self.inflight);
        if matches!(slot.as_ref(), Some((g, _)) if *g == generation) {
            *slot = None;
        }

        result
    }

    /// Write a fetch outcome unless a newer generation already landed.
    fn apply(&self, generation: u64, result: &FetchResult) {
        if self.detached.load(Ordering::SeqCst) {
            return;
        }
        let previous = self.applied.fetch_max(generation, Ordering::SeqCst);
        if previous > generation {
            trace!(key = %self.key, generation, "discarding outdated response");
            return;
        }

        let tags = self.endpoint.tags(&TagContext {
            arg: &self.arg,
            result: result.as_deref().ok(),
        });
        *lock(&self.tags) = tags;

        let stale = self.generation.load(Ordering::SeqCst) != generation;
        self.state.send_modify(|s| {
            s.is_fetching = false;
            s.is_stale = stale;
            match result {
                Ok(value) => {
                    s.status = QueryStatus::Fulfilled;
                    s.data = Some(Arc::clone(value));
                    s.error = None;
                }
                Err(err) => {
                    s.status = QueryStatus::Rejected;
                    s.error = Some(Arc::clone(err));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cache_key_ignores_field_order() {
        let a: Value = serde_json::from_str(r#"{"page":1,"search":"art","filters":{"b":2,"a":1}}"#)
            .unwrap_or_default();
        let b: Value = serde_json::from_str(r#"{"filters":{"a":1,"b":2},"search":"art","page":1}"#)
            .unwrap_or_default();
        assert_eq!(CacheKey::new("getJobs", &a), CacheKey::new("getJobs", &b));
    }

    #[test]
    fn cache_key_distinguishes_endpoint_and_arg() {
        let arg = json!({ "id": "1" });
        assert_ne!(CacheKey::new("getJob", &arg), CacheKey::new("getResource", &arg));
        assert_ne!(
            CacheKey::new("getJob", &arg),
            CacheKey::new("getJob", &json!({ "id": 1 }))
        );
        assert_eq!(
            CacheKey::new("getJob", &arg).to_string(),
            r#"getJob({"id":"1"})"#
        );
    }

    #[test]
    fn loading_means_fetching_without_data() {
        let mut state = QueryState {
            is_fetching: true,
            ..QueryState::default()
        };
        assert!(state.is_loading());

        state.data = Some(Arc::new(json!([])));
        assert!(!state.is_loading());
    }

    #[test]
    fn freshness_requires_unstale_success() {
        let mut state = QueryState {
            status: QueryStatus::Fulfilled,
            data: Some(Arc::new(json!({}))),
            ..QueryState::default()
        };
        assert!(state.is_fresh());
        state.is_stale = true;
        assert!(!state.is_fresh());
    }
}
