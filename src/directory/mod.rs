//! Remote directory service collaborator: name resolution and paginated
//! friends listing.
//!
//! The graph engine only sees the [`Directory`] trait; the concrete HTTP
//! client lives in [`http`].

pub mod http;

pub use http::HttpDirectory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// Stable identifier of a user in the social graph, distinct from the
/// human-entered username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A user as reported by the directory: identifier plus canonical display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
}

/// Opaque continuation token for paginated friends listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(pub String);

/// One page of a user's friends list. Absence of `next_cursor` signals the
/// end of pagination.
#[derive(Debug, Clone)]
pub struct FriendsPage {
    pub entries: Vec<UserRecord>,
    pub next_cursor: Option<Cursor>,
}

/// The remote directory service the graph is materialized from.
///
/// Both operations fail with [`SixDegreesError::Transient`] on network or
/// service errors; "no such user" is `Ok(None)`, a valid outcome.
///
/// [`SixDegreesError::Transient`]: crate::error::SixDegreesError::Transient
#[async_trait]
pub trait Directory: Send + Sync {
    /// Resolve a human-entered username to at most one user record.
    async fn resolve_name(&self, name: &str) -> Result<Option<UserRecord>>;

    /// List one page of a user's friends, continuing from `cursor`.
    async fn list_friends(&self, id: UserId, cursor: Option<&Cursor>) -> Result<FriendsPage>;
}
