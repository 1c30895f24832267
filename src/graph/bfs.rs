use futures_util::stream::{self, StreamExt};
use std::collections::HashSet;

use crate::directory::{Directory, UserId};
use crate::error::{Result, SixDegreesError};
use crate::graph::AdjacencyFetcher;

/// Terminal state of one search
///
/// `Exhausted` and `DepthLimitReached` both surface to callers as "no
/// connection found"; the distinction is kept here for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Shortest path found: source first, target last, one entry per node.
    Found(Vec<UserId>),
    /// The reachable component was fully explored below the depth limit:
    /// no connection exists within it.
    Exhausted,
    /// The depth limit cut the search off: a longer path may exist.
    DepthLimitReached,
}

/// Depth-bounded, level-synchronous BFS over the implicit friendship graph
///
/// The frontier holds one in-progress path per entry; each BFS round
/// expands exactly the paths enqueued before the round began, so no path
/// from a deeper level is ever processed before all paths at a shallower
/// level. That level discipline is what makes the first hit a shortest
/// path. Ties break deterministically: earliest path in level order, then
/// adjacency-list order within it.
///
/// Adjacency fetches within one level are independent, so they fan out
/// concurrently (bounded by `level_concurrency`) and join in level order
/// before any neighbor is examined. Each fetch runs as its own task: a
/// search abandoned mid-level lets already-issued fetches finish and
/// populate the shared cache, while not-yet-started ones are dropped
/// unissued.
pub struct PathFinder<D> {
    fetcher: AdjacencyFetcher<D>,
    max_hops: usize,
    level_concurrency: usize,
}

impl<D: Directory + 'static> PathFinder<D> {
    pub fn new(fetcher: AdjacencyFetcher<D>, max_hops: usize, level_concurrency: usize) -> Self {
        Self {
            fetcher,
            max_hops,
            level_concurrency: level_concurrency.max(1),
        }
    }

    /// The configured search horizon, in edges
    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Search for a shortest chain from `source` to `target`
    ///
    /// `max_hops` bounds edges, not nodes: a path of exactly `max_hops`
    /// edges is discoverable, one more is not.
    pub async fn find(&self, source: UserId, target: UserId) -> Result<SearchOutcome> {
        if source == target {
            return Ok(SearchOutcome::Found(vec![source]));
        }

        // Frontier entries carry (tail, path) so the tail is available
        // without re-inspecting the path.
        let mut frontier: Vec<(UserId, Vec<UserId>)> = vec![(source, vec![source])];
        let mut visited: HashSet<UserId> = HashSet::from([source]);
        let mut depth = 0;

        while !frontier.is_empty() && depth < self.max_hops {
            let level = std::mem::take(&mut frontier);

            let tails: Vec<UserId> = level.iter().map(|&(tail, _)| tail).collect();
            let mut fetches = stream::iter(tails.into_iter().map(|tail| {
                let fetcher = self.fetcher.clone();
                async move {
                    tokio::spawn(async move { fetcher.adjacents(tail).await })
                        .await
                        .map_err(|e| {
                            SixDegreesError::Internal(format!("adjacency fetch task failed: {}", e))
                        })
                }
            }))
            .buffered(self.level_concurrency);

            let mut index = 0;
            while let Some(joined) = fetches.next().await {
                let friends = joined??;
                let (_, path) = &level[index];
                index += 1;

                for &friend in friends.iter() {
                    if visited.contains(&friend) {
                        continue;
                    }

                    let mut extended = path.clone();
                    extended.push(friend);

                    if friend == target {
                        return Ok(SearchOutcome::Found(extended));
                    }

                    // Marking at enqueue time keeps the frontier free of
                    // duplicate tails within and across levels.
                    visited.insert(friend);
                    frontier.push((friend, extended));
                }
            }

            depth += 1;
            log::debug!(
                "level {} expanded: frontier {}, visited {}",
                depth,
                frontier.len(),
                visited.len()
            );
        }

        if frontier.is_empty() {
            Ok(SearchOutcome::Exhausted)
        } else {
            Ok(SearchOutcome::DepthLimitReached)
        }
    }
}
