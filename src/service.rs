use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{AdjacencyCache, IdentityCache};
use crate::config::Config;
use crate::directory::Directory;
use crate::error::{Result, SixDegreesError};
use crate::graph::{assemble, AdjacencyFetcher, Connection, IdentityResolver, PathFinder, SearchOutcome};

/// The core-exposed connection search
///
/// Owns the process-wide caches and wires the resolver, fetcher and path
/// finder together. One instance is shared across all concurrent requests;
/// each search gets its own frontier and visited state, while the caches
/// (and their in-flight coalescing) are shared.
pub struct ConnectionService<D> {
    resolver: IdentityResolver<D>,
    finder: PathFinder<D>,
    identities: Arc<IdentityCache>,
}

impl<D: Directory + 'static> ConnectionService<D> {
    pub fn new(directory: Arc<D>, config: &Config) -> Self {
        let identities = Arc::new(IdentityCache::new(config.cache.identity_capacity));
        let adjacency = Arc::new(AdjacencyCache::new(config.cache.adjacency_capacity));

        let resolver = IdentityResolver::new(Arc::clone(&directory), Arc::clone(&identities));
        let fetcher = AdjacencyFetcher::new(directory, adjacency, Arc::clone(&identities));
        let finder = PathFinder::new(
            fetcher,
            config.search.max_hops,
            config.search.level_concurrency,
        );

        Self {
            resolver,
            finder,
            identities,
        }
    }

    /// Find the shortest friendship chain between two usernames
    ///
    /// Resolution misses short-circuit the search: `FromNotFound` wins over
    /// `ToNotFound`, and no adjacency is fetched for an unresolvable pair.
    /// Both "component exhausted" and "depth limit reached" report as
    /// [`SixDegreesError::NoConnectionFound`]; the internal distinction is
    /// only logged.
    pub async fn find_connection(&self, from: &str, to: &str) -> Result<Connection> {
        let search_id = Uuid::new_v4();
        log::info!("search {}: {:?} -> {:?}", search_id, from, to);

        let source = self
            .resolver
            .resolve(from)
            .await?
            .ok_or_else(|| SixDegreesError::FromNotFound(from.trim().to_string()))?;
        let target = self
            .resolver
            .resolve(to)
            .await?
            .ok_or_else(|| SixDegreesError::ToNotFound(to.trim().to_string()))?;

        match self.finder.find(source, target).await? {
            SearchOutcome::Found(path) => {
                let connection = assemble(&path, &self.identities);
                log::info!(
                    "search {}: found chain of {} degrees",
                    search_id,
                    connection.degree_count
                );
                Ok(connection)
            }
            SearchOutcome::Exhausted => {
                log::info!("search {}: component exhausted, no connection", search_id);
                Err(SixDegreesError::NoConnectionFound)
            }
            SearchOutcome::DepthLimitReached => {
                log::info!(
                    "search {}: no connection within {} hops, longer chains unknown",
                    search_id,
                    self.finder.max_hops()
                );
                Err(SixDegreesError::NoConnectionFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::UserId;
    use crate::testutil::MockDirectory;

    fn service(mock: MockDirectory) -> (ConnectionService<MockDirectory>, Arc<MockDirectory>) {
        let directory = Arc::new(mock);
        let config = Config::default();
        (
            ConnectionService::new(Arc::clone(&directory), &config),
            directory,
        )
    }

    fn chain_graph() -> MockDirectory {
        // Alice - Bob - Carol - Dave
        let mut mock = MockDirectory::new(100);
        mock.add_user(1, "Alice");
        mock.add_user(2, "Bob");
        mock.add_user(3, "Carol");
        mock.add_user(4, "Dave");
        mock.add_friendship(1, 2);
        mock.add_friendship(2, 3);
        mock.add_friendship(3, 4);
        mock
    }

    #[tokio::test]
    async fn test_find_connection_line_graph() {
        let (service, _) = service(chain_graph());

        let connection = service.find_connection("Alice", "Dave").await.unwrap();
        assert_eq!(connection.degree_count, 3);
        let names: Vec<_> = connection.chain.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Carol", "Dave"]);
        let ids: Vec<_> = connection.chain.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![UserId(1), UserId(2), UserId(3), UserId(4)]);
    }

    #[tokio::test]
    async fn test_self_connection_zero_degrees_zero_fetches() {
        let (service, directory) = service(chain_graph());

        let connection = service.find_connection("Alice", "Alice").await.unwrap();
        assert_eq!(connection.degree_count, 0);
        assert_eq!(connection.chain.len(), 1);
        assert_eq!(connection.chain[0].name, "Alice");
        assert_eq!(directory.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_case_insensitive_endpoints_share_cache() {
        let (service, directory) = service(chain_graph());

        let connection = service.find_connection("Alice", "alice").await.unwrap();
        assert_eq!(connection.degree_count, 0);
        // Second endpoint hit the identity cache
        assert_eq!(directory.resolve_calls(), 1);
    }

    #[tokio::test]
    async fn test_from_not_found_short_circuits() {
        let (service, directory) = service(chain_graph());

        let result = service.find_connection("ghost", "Bob").await;
        assert!(matches!(result, Err(SixDegreesError::FromNotFound(name)) if name == "ghost"));
        // "Bob" was never resolved and no adjacency was fetched
        assert_eq!(directory.resolve_calls(), 1);
        assert_eq!(directory.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_to_not_found() {
        let (service, directory) = service(chain_graph());

        let result = service.find_connection("Alice", "ghost").await;
        assert!(matches!(result, Err(SixDegreesError::ToNotFound(name)) if name == "ghost"));
        assert_eq!(directory.page_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_connection_beyond_horizon() {
        // 8 users in a line: 7 edges, one past the default horizon of 6
        let mut mock = MockDirectory::new(100);
        for id in 1..=8u64 {
            mock.add_user(id, &format!("user{}", id));
        }
        for id in 1..8u64 {
            mock.add_friendship(id, id + 1);
        }
        let (service, _) = service(mock);

        let result = service.find_connection("user1", "user8").await;
        assert!(matches!(result, Err(SixDegreesError::NoConnectionFound)));
    }

    #[tokio::test]
    async fn test_disconnected_users_report_no_connection() {
        let mut mock = chain_graph();
        mock.add_user(9, "Island");
        let (service, _) = service(mock);

        let result = service.find_connection("Alice", "Island").await;
        assert!(matches!(result, Err(SixDegreesError::NoConnectionFound)));
    }

    #[tokio::test]
    async fn test_transient_failure_propagates() {
        let (service, directory) = service(chain_graph());
        directory.fail_friends_of(UserId(2));

        let result = service.find_connection("Alice", "Dave").await;
        assert!(matches!(result, Err(SixDegreesError::Transient(_))));
    }

    #[tokio::test]
    async fn test_second_search_reuses_adjacency_cache() {
        let (service, directory) = service(chain_graph());

        service.find_connection("Alice", "Dave").await.unwrap();
        let pages_after_first = directory.page_calls();
        service.find_connection("Alice", "Dave").await.unwrap();
        // Every adjacency the second search needed was already cached
        assert_eq!(directory.page_calls(), pages_after_first);
    }
}
