//! In-memory mock of the remote directory for tests: a user table and
//! symmetric friendships served through the real [`Directory`] trait with
//! genuine cursor pagination, call counters, and injectable failures.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::directory::{Cursor, Directory, FriendsPage, UserId, UserRecord};
use crate::error::{Result, SixDegreesError};

pub struct MockDirectory {
    users: HashMap<String, UserRecord>,
    names: HashMap<u64, String>,
    friends: HashMap<UserId, Vec<UserRecord>>,
    page_size: usize,
    resolve_calls: AtomicUsize,
    page_calls: AtomicUsize,
    /// Pagination sequences started per id (cursor-less first pages)
    sequences: Mutex<HashMap<UserId, usize>>,
    fail_friends: Mutex<HashSet<UserId>>,
    fail_continuation: Mutex<HashSet<UserId>>,
}

impl MockDirectory {
    pub fn new(page_size: usize) -> Self {
        Self {
            users: HashMap::new(),
            names: HashMap::new(),
            friends: HashMap::new(),
            page_size: page_size.max(1),
            resolve_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
            sequences: Mutex::new(HashMap::new()),
            fail_friends: Mutex::new(HashSet::new()),
            fail_continuation: Mutex::new(HashSet::new()),
        }
    }

    pub fn add_user(&mut self, id: u64, name: &str) {
        let record = UserRecord {
            id: UserId(id),
            name: name.to_string(),
        };
        self.users.insert(name.to_lowercase(), record);
        self.names.insert(id, name.to_string());
        self.friends.entry(UserId(id)).or_default();
    }

    /// Record a mutual friendship; both users must already exist.
    pub fn add_friendship(&mut self, a: u64, b: u64) {
        let record_of = |names: &HashMap<u64, String>, id: u64| UserRecord {
            id: UserId(id),
            name: names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| format!("user{}", id)),
        };
        let record_a = record_of(&self.names, a);
        let record_b = record_of(&self.names, b);
        self.friends.entry(UserId(a)).or_default().push(record_b);
        self.friends.entry(UserId(b)).or_default().push(record_a);
    }

    /// Make every friends request for `id` fail
    pub fn fail_friends_of(&self, id: UserId) {
        self.fail_friends.lock().unwrap().insert(id);
    }

    /// Make only continuation pages (cursor present) for `id` fail
    pub fn fail_continuation_of(&self, id: UserId) {
        self.fail_continuation.lock().unwrap().insert(id);
    }

    pub fn clear_failures(&self) {
        self.fail_friends.lock().unwrap().clear();
        self.fail_continuation.lock().unwrap().clear();
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    /// Number of pagination sequences started for `id`
    pub fn sequences_for(&self, id: UserId) -> usize {
        self.sequences.lock().unwrap().get(&id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Directory for MockDirectory {
    async fn resolve_name(&self, name: &str) -> Result<Option<UserRecord>> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.get(&name.trim().to_lowercase()).cloned())
    }

    async fn list_friends(&self, id: UserId, cursor: Option<&Cursor>) -> Result<FriendsPage> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_friends.lock().unwrap().contains(&id) {
            return Err(SixDegreesError::Transient("injected failure".to_string()));
        }
        if cursor.is_some() && self.fail_continuation.lock().unwrap().contains(&id) {
            return Err(SixDegreesError::Transient(
                "injected continuation failure".to_string(),
            ));
        }

        let all = self.friends.get(&id).cloned().unwrap_or_default();

        let start = match cursor {
            Some(cursor) => cursor.0.parse::<usize>().map_err(|_| {
                SixDegreesError::Transient(format!("malformed cursor: {}", cursor.0))
            })?,
            None => {
                *self.sequences.lock().unwrap().entry(id).or_insert(0) += 1;
                0
            }
        };

        let end = (start + self.page_size).min(all.len());
        let next_cursor = if end < all.len() {
            Some(Cursor(end.to_string()))
        } else {
            None
        };

        Ok(FriendsPage {
            entries: all[start..end].to_vec(),
            next_cursor,
        })
    }
}
