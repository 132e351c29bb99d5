//! Summary cache
//!
//! Cache-aside in front of the order, venue and license read models, with
//! invalidation sets generated from [`graph`].

pub mod graph;
pub mod keys;
pub mod store;
pub mod summary_cache;

pub use graph::{OrderFootprint, invalidation_keys};
pub use keys::{CacheKey, CacheResource};
pub use store::{CacheStore, MemoryCacheStore};
pub use summary_cache::SummaryCache;

use thiserror::Error;

/// Cache failures; recovered locally (logged), never returned to callers of
/// the order service
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
