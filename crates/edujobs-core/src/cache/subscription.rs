// ── Query subscriptions ──
//
// A subscription is a live view of one cache entry. While it exists the
// entry counts as observed: invalidations refetch it eagerly and the
// pruner leaves it alone.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::entry::{CacheEntry, CacheKey, QueryState};
use crate::error::CoreError;

/// Handle returned by [`QueryCache::subscribe`](super::QueryCache::subscribe).
pub struct QuerySubscription {
    entry: Arc<CacheEntry>,
    receiver: watch::Receiver<QueryState>,
}

impl QuerySubscription {
    pub(crate) fn new(entry: Arc<CacheEntry>) -> Self {
        let receiver = entry.subscribe();
        Self { entry, receiver }
    }

    pub fn key(&self) -> &CacheKey {
        self.entry.key()
    }

    /// Current state without waiting.
    pub fn state(&self) -> QueryState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state transition.
    ///
    /// After a cache reset the entry is detached: one final cleared state is
    /// delivered, and the subscription should be re-created to keep tracking
    /// the query. Returns `None` if no further updates can arrive.
    pub async fn changed(&mut self) -> Option<QueryState> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Force a fetch, sharing any request already in flight.
    pub async fn refetch(&self) -> Result<Arc<Value>, CoreError> {
        self.entry.fetch().await.map_err(CoreError::from)
    }
}

impl std::fmt::Debug for QuerySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", self.entry.key())
            .finish_non_exhaustive()
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        // Idle time for pruning starts when the last view goes away.
        self.entry.touch();
    }
}
