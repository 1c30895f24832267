use lru::LruCache;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::directory::{UserId, UserRecord};
use crate::error::Result;

/// Thread-safe LRU cache of identity lookups
///
/// Holds two mappings: normalized username -> id, and id -> display name.
/// The name side is populated opportunistically whenever an identity is
/// observed, whether as a resolution result or as an entry in someone
/// else's friends list; for most identities in a chain it is the only
/// source of a display name.
///
/// Concurrent lookups for the same username are coalesced into a single
/// directory call. A "no such user" result is shared with concurrent
/// waiters but never cached, so a name that exists later is still findable.
pub struct IdentityCache {
    ids: Mutex<LruCache<String, UserId>>,
    names: Mutex<LruCache<UserId, String>>,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<Option<UserRecord>>>>>,
}

impl IdentityCache {
    /// Create a new identity cache; both mappings get the same capacity
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0 (LRU cache requires non-zero capacity)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("Cache capacity must be at least 1");

        Self {
            ids: Mutex::new(LruCache::new(cap)),
            names: Mutex::new(LruCache::new(cap)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get the cached id for a normalized username key
    pub fn cached_id(&self, key: &str) -> Option<UserId> {
        self.ids.lock().unwrap().get(key).copied()
    }

    /// Get the cached display name for an id
    pub fn display_name(&self, id: UserId) -> Option<String> {
        self.names.lock().unwrap().get(&id).cloned()
    }

    /// Record a display name observed for an id
    pub fn record_name(&self, id: UserId, name: &str) {
        self.names.lock().unwrap().put(id, name.to_string());
    }

    /// Get the id for `key`, or run `resolve` to look it up
    ///
    /// `key` must already be normalized (trimmed, lower-cased). On a
    /// `Some` result both the id and display-name mappings are populated.
    /// Concurrent callers for the same key share one resolver invocation.
    pub async fn lookup_or_resolve<F, Fut>(&self, key: &str, resolve: F) -> Result<Option<UserId>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<UserRecord>>>,
    {
        if let Some(id) = self.cached_id(key) {
            return Ok(Some(id));
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap();
            // Re-check under the in-flight lock: a concurrent lookup may have
            // completed between the miss above and acquiring this lock.
            if let Some(id) = self.ids.lock().unwrap().get(key) {
                return Ok(Some(*id));
            }
            in_flight.entry(key.to_string()).or_default().clone()
        };

        match cell.get_or_try_init(resolve).await {
            Ok(Some(record)) => {
                let record = record.clone();
                self.ids.lock().unwrap().put(key.to_string(), record.id);
                self.record_name(record.id, &record.name);
                self.clear_in_flight(key, &cell);
                Ok(Some(record.id))
            }
            Ok(None) => {
                self.clear_in_flight(key, &cell);
                Ok(None)
            }
            Err(e) => {
                self.clear_in_flight(key, &cell);
                Err(e)
            }
        }
    }

    /// Remove `cell` from the in-flight table, but only if it is still the
    /// current one for `key`.
    fn clear_in_flight(&self, key: &str, cell: &Arc<OnceCell<Option<UserRecord>>>) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(current) = in_flight.get(key) {
            if Arc::ptr_eq(current, cell) {
                in_flight.remove(key);
            }
        }
    }

    /// Number of cached username -> id entries
    pub fn len(&self) -> usize {
        self.ids.lock().unwrap().len()
    }

    /// Check if the id mapping is empty
    pub fn is_empty(&self) -> bool {
        self.ids.lock().unwrap().is_empty()
    }
}
