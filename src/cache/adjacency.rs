use lru::LruCache;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

use crate::directory::UserId;
use crate::error::Result;

/// A user's complete friends list, aggregated across all pages.
/// Immutable once cached.
pub type AdjacencyList = Arc<Vec<UserId>>;

/// Thread-safe LRU cache of complete adjacency lists
///
/// Caches the full friends list per user so repeated searches never repeat
/// a pagination sequence. Concurrent misses for the same user are coalesced
/// into a single underlying fetch: one caller runs the producer, the rest
/// await its result. A failed fetch caches nothing, so a partial pagination
/// sequence can never poison the cache.
pub struct AdjacencyCache {
    entries: Mutex<LruCache<UserId, AdjacencyList>>,
    in_flight: Mutex<HashMap<UserId, Arc<OnceCell<AdjacencyList>>>>,
}

impl AdjacencyCache {
    /// Create a new adjacency cache with the specified capacity
    ///
    /// # Panics
    ///
    /// Panics if capacity is 0 (LRU cache requires non-zero capacity)
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).expect("Cache capacity must be at least 1");

        Self {
            entries: Mutex::new(LruCache::new(cap)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Get a cached adjacency list, if present
    pub fn get(&self, id: UserId) -> Option<AdjacencyList> {
        self.entries.lock().unwrap().get(&id).cloned()
    }

    /// Get the cached list for `id`, or run `fetch` to produce it
    ///
    /// The producer must return the complete accumulated list; it is stored
    /// under `id` before this returns. Concurrent callers for the same `id`
    /// share one producer invocation.
    pub async fn get_or_fetch<F, Fut>(&self, id: UserId, fetch: F) -> Result<AdjacencyList>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AdjacencyList>>,
    {
        if let Some(hit) = self.get(id) {
            return Ok(hit);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap();
            // Re-check under the in-flight lock: a concurrent fetch may have
            // completed between the miss above and acquiring this lock.
            if let Some(hit) = self.entries.lock().unwrap().get(&id) {
                return Ok(hit.clone());
            }
            in_flight.entry(id).or_default().clone()
        };

        match cell.get_or_try_init(fetch).await {
            Ok(list) => {
                let list = list.clone();
                self.entries.lock().unwrap().put(id, list.clone());
                self.clear_in_flight(id, &cell);
                Ok(list)
            }
            Err(e) => {
                self.clear_in_flight(id, &cell);
                Err(e)
            }
        }
    }

    /// Remove `cell` from the in-flight table, but only if it is still the
    /// current one: a late waiter of a failed fetch must not evict the cell
    /// of a fresh retry already underway.
    fn clear_in_flight(&self, id: UserId, cell: &Arc<OnceCell<AdjacencyList>>) {
        let mut in_flight = self.in_flight.lock().unwrap();
        if let Some(current) = in_flight.get(&id) {
            if Arc::ptr_eq(current, cell) {
                in_flight.remove(&id);
            }
        }
    }

    /// Get the current number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SixDegreesError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn list(ids: &[u64]) -> AdjacencyList {
        Arc::new(ids.iter().copied().map(UserId).collect())
    }

    #[tokio::test]
    async fn test_miss_runs_producer_then_hit() {
        let cache = AdjacencyCache::new(10);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        for _ in 0..3 {
            let result = cache
                .get_or_fetch(UserId(1), || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(list(&[2, 3]))
                })
                .await
                .unwrap();
            assert_eq!(*result, vec![UserId(2), UserId(3)]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_coalesce() {
        let cache = Arc::new(AdjacencyCache::new(10));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch(UserId(7), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(list(&[1]))
                    })
                    .await
            }));
        }

        for handle in handles {
            let result = handle.await.unwrap().unwrap();
            assert_eq!(*result, vec![UserId(1)]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_not_cached() {
        let cache = AdjacencyCache::new(10);
        let calls = AtomicUsize::new(0);
        let calls = &calls;

        let result = cache
            .get_or_fetch(UserId(1), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SixDegreesError::Transient("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());

        // Next caller retries from scratch and can succeed
        let result = cache
            .get_or_fetch(UserId(1), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(list(&[5]))
            })
            .await
            .unwrap();
        assert_eq!(*result, vec![UserId(5)]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_eviction_refetches() {
        let cache = AdjacencyCache::new(1);
        let calls = AtomicUsize::new(0);

        let fetch = |ids: &'static [u64]| {
            let calls = &calls;
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(list(ids))
            }
        };

        cache.get_or_fetch(UserId(1), fetch(&[10])).await.unwrap();
        cache.get_or_fetch(UserId(2), fetch(&[20])).await.unwrap(); // evicts 1
        assert!(cache.get(UserId(1)).is_none());
        cache.get_or_fetch(UserId(1), fetch(&[10])).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = AdjacencyCache::new(10);
        cache
            .get_or_fetch(UserId(1), || async move { Ok(list(&[2])) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(UserId(1)).is_none());
    }
}
