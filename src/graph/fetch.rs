use std::sync::Arc;

use crate::cache::adjacency::AdjacencyList;
use crate::cache::{AdjacencyCache, IdentityCache};
use crate::directory::{Cursor, Directory, UserId};
use crate::error::Result;

/// Retrieves complete friends lists, one node at a time
///
/// On a cache miss the fetcher drains the directory's pagination: request a
/// page, accumulate entries, follow the continuation cursor until the
/// service stops returning one. Every entry seen on every page also records
/// its display name into the identity cache; for identities that are never
/// resolved as endpoints this is the only place a name is learned.
///
/// Safe to call repeatedly for the same id: the adjacency cache (including
/// its in-flight coalescing) guarantees one pagination sequence per id.
pub struct AdjacencyFetcher<D> {
    directory: Arc<D>,
    cache: Arc<AdjacencyCache>,
    identities: Arc<IdentityCache>,
}

impl<D> Clone for AdjacencyFetcher<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            cache: Arc::clone(&self.cache),
            identities: Arc::clone(&self.identities),
        }
    }
}

impl<D: Directory> AdjacencyFetcher<D> {
    pub fn new(
        directory: Arc<D>,
        cache: Arc<AdjacencyCache>,
        identities: Arc<IdentityCache>,
    ) -> Self {
        Self {
            directory,
            cache,
            identities,
        }
    }

    /// Complete friends list for `id`, from cache or by draining pagination
    pub async fn adjacents(&self, id: UserId) -> Result<AdjacencyList> {
        self.cache.get_or_fetch(id, || self.fetch_all(id)).await
    }

    async fn fetch_all(&self, id: UserId) -> Result<AdjacencyList> {
        let mut friends = Vec::new();
        let mut cursor: Option<Cursor> = None;
        let mut pages = 0usize;

        loop {
            let page = self.directory.list_friends(id, cursor.as_ref()).await?;
            pages += 1;

            for entry in page.entries {
                self.identities.record_name(entry.id, &entry.name);
                friends.push(entry.id);
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        log::debug!(
            "fetched {} friends of {} across {} pages",
            friends.len(),
            id,
            pages
        );

        Ok(Arc::new(friends))
    }
}
