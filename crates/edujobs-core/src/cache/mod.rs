// ── Query cache ──
//
// Caches query results per (endpoint, argument), deduplicates identical
// in-flight requests, and refreshes results when a successful mutation
// invalidates one of their tags.
//
// Invalidation marks every matching entry stale. Entries that someone is
// watching are refetched before the mutation call returns; the rest are
// refetched lazily on their next `query`.

mod entry;
mod subscription;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use edujobs_api::ApiClient;
use futures_util::future::join_all;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::endpoint::{EndpointKind, TagContext};
use crate::error::CoreError;
use crate::registry::EndpointRegistry;
use crate::tag::Tag;

pub use entry::{CacheKey, QueryState, QueryStatus};
pub use subscription::QuerySubscription;

use entry::CacheEntry;

/// How long an unobserved entry is kept before `prune_unused` drops it.
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

/// Tag-invalidated cache in front of an [`ApiClient`].
pub struct QueryCache {
    client: Arc<ApiClient>,
    registry: Arc<EndpointRegistry>,
    entries: DashMap<CacheKey, Arc<CacheEntry>>,
    keep_unused_for: Duration,
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.entries.len())
            .field("keep_unused_for", &self.keep_unused_for)
            .finish_non_exhaustive()
    }
}

impl QueryCache {
    pub fn new(client: Arc<ApiClient>, registry: Arc<EndpointRegistry>) -> Self {
        Self {
            client,
            registry,
            entries: DashMap::new(),
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
        }
    }

    #[must_use]
    pub fn with_keep_unused_for(mut self, keep_unused_for: Duration) -> Self {
        self.keep_unused_for = keep_unused_for;
        self
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Return the cached result when fresh, otherwise fetch it.
    ///
    /// Concurrent calls with an equal `(endpoint, arg)` share one request.
    pub async fn query(&self, endpoint: &str, arg: &Value) -> Result<Arc<Value>, CoreError> {
        let entry = self.entry(endpoint, arg)?;
        let state = entry.state();
        if state.is_fresh() {
            if let Some(data) = state.data {
                trace!(key = %entry.key(), "cache hit");
                entry.touch();
                return Ok(data);
            }
        }
        entry.fetch().await.map_err(CoreError::from)
    }

    /// Observe a query. The first load (or a refresh of stale data) is
    /// performed before returning; its outcome is part of the state.
    pub async fn subscribe(
        &self,
        endpoint: &str,
        arg: &Value,
    ) -> Result<QuerySubscription, CoreError> {
        let entry = self.entry(endpoint, arg)?;
        let subscription = QuerySubscription::new(Arc::clone(&entry));
        if !entry.state().is_fresh() {
            // Failures are recorded in the subscription state.
            let _ = entry.fetch().await;
        }
        Ok(subscription)
    }

    /// Current state of a cached query without fetching.
    pub fn peek(&self, endpoint: &str, arg: &Value) -> Option<QueryState> {
        self.entries
            .get(&CacheKey::new(endpoint, arg))
            .map(|entry| entry.state())
    }

    fn entry(&self, endpoint: &str, arg: &Value) -> Result<Arc<CacheEntry>, CoreError> {
        let key = CacheKey::new(endpoint, arg);
        if let Some(existing) = self.entries.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let definition = self.registry.expect(endpoint, EndpointKind::Query)?;
        let request = definition.build_request(arg)?;
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| {
                trace!(%key, "new cache entry");
                Arc::new(CacheEntry::new(
                    key,
                    definition,
                    arg.clone(),
                    request,
                    Arc::clone(&self.client),
                ))
            })
            .value()
            .clone();
        Ok(entry)
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Run a mutation and invalidate whatever its result affects.
    pub async fn mutate(&self, endpoint: &str, arg: &Value) -> Result<Arc<Value>, CoreError> {
        self.mutate_then(endpoint, arg, |_| Ok(())).await.map(|(value, ())| value)
    }

    /// Run a mutation, hand the successful result to `on_success`, then
    /// invalidate.
    ///
    /// `on_success` runs before any refetch, so state it changes (such as
    /// freshly issued credentials) is visible to the refetched queries. A
    /// failed request invalidates nothing and returns the API error as-is.
    pub async fn mutate_then<R>(
        &self,
        endpoint: &str,
        arg: &Value,
        on_success: impl FnOnce(&Arc<Value>) -> Result<R, CoreError>,
    ) -> Result<(Arc<Value>, R), CoreError> {
        let definition = self.registry.expect(endpoint, EndpointKind::Mutation)?;
        let req = definition.build_request(arg)?;

        debug!(endpoint, path = %req.path, method = %req.method, "mutation");
        let result = self
            .client
            .request_with_query(&req.path, req.method, &req.query, req.body.as_ref())
            .await
            .map(Arc::new)?;

        let extra = on_success(&result)?;

        let tags = definition.tags(&TagContext {
            arg,
            result: Some(&result),
        });
        self.invalidate_tags(&tags).await;

        Ok((result, extra))
    }

    // ── Invalidation ─────────────────────────────────────────────────

    /// Mark every entry carrying one of `tags` stale and refetch the ones
    /// with subscribers. Returns the number of entries invalidated.
    pub async fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        if tags.is_empty() {
            return 0;
        }

        let hit: Vec<Arc<CacheEntry>> = self
            .entries
            .iter()
            .filter(|entry| entry.matches(tags))
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        for entry in &hit {
            entry.invalidate();
        }

        let observed: Vec<&Arc<CacheEntry>> =
            hit.iter().filter(|e| e.subscriber_count() > 0).collect();

        debug!(
            tags = %display_tags(tags),
            invalidated = hit.len(),
            refetching = observed.len(),
            "tags invalidated"
        );

        // Failures land in each entry's state for its subscribers.
        join_all(observed.into_iter().map(|entry| entry.fetch())).await;

        hit.len()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Drop every entry. Live subscriptions receive a cleared state.
    pub fn reset(&self) {
        let count = self.entries.len();
        let drained: Vec<Arc<CacheEntry>> = self
            .entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.entries.clear();
        for entry in drained {
            entry.detach();
        }
        info!(entries = count, "cache reset");
    }

    /// Drop entries nobody observes that have sat unused for longer than
    /// `keep_unused_for`. Returns the number removed.
    pub fn prune_unused(&self) -> usize {
        let before = self.entries.len();
        let keep = self.keep_unused_for;
        self.entries.retain(|_, entry| {
            entry.subscriber_count() > 0 || entry.is_fetching() || entry.idle_for() < keep
        });
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "pruned unused cache entries");
        }
        removed
    }

    /// Run [`prune_unused`](Self::prune_unused) every `interval` until
    /// `cancel` fires.
    pub fn spawn_pruner(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        cache.prune_unused();
                    }
                }
            }
            debug!("cache pruner stopped");
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags currently attached to a cached query.
    pub fn tags_of(&self, endpoint: &str, arg: &Value) -> Option<Vec<Tag>> {
        self.entries
            .get(&CacheKey::new(endpoint, arg))
            .map(|entry| entry.tags())
    }
}

fn display_tags(tags: &[Tag]) -> String {
    tags.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
