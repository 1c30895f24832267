//! Friendship-graph engine: identity resolution, paginated adjacency
//! fetching, and the depth-bounded BFS that discovers shortest chains.
//!
//! The graph is implicit: edges are only revealed by asking the remote
//! directory for a node's friends, so every component here leans on the
//! shared caches to keep network work minimal.

mod bfs;
mod chain;
mod fetch;
mod resolve;

pub use bfs::{PathFinder, SearchOutcome};
pub use chain::{assemble, ChainLink, Connection};
pub use fetch::AdjacencyFetcher;
pub use resolve::IdentityResolver;
