use std::sync::Arc;

use crate::cache::IdentityCache;
use crate::directory::{Directory, UserId};
use crate::error::{Result, SixDegreesError};

/// Resolves human-entered usernames to stable identifiers
///
/// Usernames are matched case-insensitively: the cache key is the trimmed,
/// lower-cased name, so "Alice" and "alice" share one entry and one
/// directory call. A name that does not resolve is a reportable outcome
/// (`Ok(None)`), not a fault, and is never cached.
pub struct IdentityResolver<D> {
    directory: Arc<D>,
    cache: Arc<IdentityCache>,
}

impl<D> Clone for IdentityResolver<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<D: Directory> IdentityResolver<D> {
    pub fn new(directory: Arc<D>, cache: Arc<IdentityCache>) -> Self {
        Self { directory, cache }
    }

    /// Resolve a username to its id
    ///
    /// Returns `Ok(None)` when the directory knows no such user.
    pub async fn resolve(&self, username: &str) -> Result<Option<UserId>> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(SixDegreesError::InvalidInput(
                "username must not be empty".to_string(),
            ));
        }

        let key = trimmed.to_lowercase();
        self.cache
            .lookup_or_resolve(&key, || async move {
                log::debug!("resolving username {:?}", trimmed);
                self.directory.resolve_name(trimmed).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockDirectory;

    fn resolver(mock: MockDirectory) -> (IdentityResolver<MockDirectory>, Arc<MockDirectory>) {
        let directory = Arc::new(mock);
        let cache = Arc::new(IdentityCache::new(64));
        (
            IdentityResolver::new(Arc::clone(&directory), cache),
            directory,
        )
    }

    #[tokio::test]
    async fn test_resolve_known_user() {
        let mut mock = MockDirectory::new(100);
        mock.add_user(42, "Alice");
        let (resolver, _) = resolver(mock);

        let id = resolver.resolve("Alice").await.unwrap();
        assert_eq!(id, Some(UserId(42)));
    }

    #[tokio::test]
    async fn test_resolve_unknown_user() {
        let (resolver, directory) = resolver(MockDirectory::new(100));

        assert_eq!(resolver.resolve("ghost").await.unwrap(), None);
        assert_eq!(resolver.resolve("ghost").await.unwrap(), None);
        // Not-found is never cached, so both attempts hit the directory
        assert_eq!(directory.resolve_calls(), 2);
    }

    #[tokio::test]
    async fn test_resolve_case_insensitive_cache() {
        let mut mock = MockDirectory::new(100);
        mock.add_user(42, "Alice");
        let (resolver, directory) = resolver(mock);

        assert_eq!(resolver.resolve("Alice").await.unwrap(), Some(UserId(42)));
        assert_eq!(resolver.resolve("alice").await.unwrap(), Some(UserId(42)));
        assert_eq!(resolver.resolve("  ALICE  ").await.unwrap(), Some(UserId(42)));
        // One directory call: the rest hit the shared cache entry
        assert_eq!(directory.resolve_calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_rejects_empty() {
        let (resolver, directory) = resolver(MockDirectory::new(100));

        let result = resolver.resolve("   ").await;
        assert!(matches!(result, Err(SixDegreesError::InvalidInput(_))));
        assert_eq!(directory.resolve_calls(), 0);
    }
}
