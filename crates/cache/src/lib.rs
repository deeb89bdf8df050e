//! Decision cache for nsgate
//!
//! This crate provides the namespace-partitioned cache used by the
//! authorizer:
//! - Flat `namespace:key` key space with LRU eviction
//! - Per-entry TTL
//! - Subtree invalidation driven by notification bus messages
//! - Stable cache-key digests for decision contexts

pub mod config;
pub mod entry;
pub mod keys;
pub mod namespaced;
pub mod stats;

pub use config::NamespacedCacheConfig;
pub use entry::CacheEntry;
pub use keys::{cache_key, composite_key, split_composite_key};
pub use namespaced::NamespacedCache;
pub use stats::CacheStats;
