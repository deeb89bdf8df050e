//! Namespace-partitioned LRU cache with subtree invalidation

use crate::config::NamespacedCacheConfig;
use crate::entry::CacheEntry;
use crate::keys::composite_key;
use crate::stats::{CacheStats, StatsRecorder};
use lru::LruCache;
use nsgate_core::events::spawn_subscription;
use nsgate_core::{namespace, NotificationBus, ShutdownSignal, KEY_SEPARATOR};
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A capacity-bounded, TTL-aware cache keyed by `(namespace, key)`.
///
/// All entries live in a single flat key space, `namespace + ":" + key`, so
/// that the whole subtree of a namespace can be dropped with two prefix
/// scans. Entries are shared behind an [`Arc`] and never mutated: `set`
/// replaces them whole.
pub struct NamespacedCache<V> {
    entries: Mutex<LruCache<String, Arc<CacheEntry<V>>>>,
    config: NamespacedCacheConfig,
    stats: StatsRecorder,
}

impl<V> NamespacedCache<V> {
    pub fn new(config: NamespacedCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            config,
            stats: StatsRecorder::default(),
        }
    }

    /// Cache with the default configuration and the given capacity.
    pub fn with_capacity(max_entries: usize) -> Self {
        Self::new(NamespacedCacheConfig {
            max_entries,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &NamespacedCacheConfig {
        &self.config
    }

    /// Store `value` under `(namespace, key)` for `ttl`, replacing any
    /// previous entry.
    pub fn set(&self, namespace: &str, key: &str, value: V, ttl: Duration) {
        let full_key = composite_key(namespace, key);
        let entry = Arc::new(CacheEntry::new(value, ttl));

        let displaced = self.entries.lock().push(full_key.clone(), entry);
        self.stats.write();

        if let Some((evicted, _)) = displaced {
            if evicted != full_key {
                self.stats.eviction();
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }
    }

    /// Live entry stored under `(namespace, key)`. Expired entries are
    /// removed and reported as absent.
    pub fn get(&self, namespace: &str, key: &str) -> Option<Arc<CacheEntry<V>>> {
        let full_key = composite_key(namespace, key);
        let mut entries = self.entries.lock();

        let Some(entry) = entries.get(&full_key) else {
            self.stats.miss();
            return None;
        };

        if entry.is_expired() {
            entries.pop(&full_key);
            self.stats.expiration();
            self.stats.miss();
            return None;
        }

        self.stats.hit();
        Some(Arc::clone(entry))
    }

    /// Remove the entry under `(namespace, key)`.
    pub fn delete(&self, namespace: &str, key: &str) -> bool {
        self.delete_key(&composite_key(namespace, key))
    }

    /// Remove an entry by its composite key.
    pub fn delete_key(&self, full_key: &str) -> bool {
        self.entries.lock().pop(full_key).is_some()
    }

    /// Remove every entry of `namespace` and of all its descendants.
    ///
    /// Returns the number of removed entries. Invalid namespaces remove
    /// nothing.
    pub fn invalidate_namespace(&self, namespace: &str) -> usize {
        if let Err(e) = namespace::validate(namespace) {
            warn!(namespace, error = %e, "Ignoring invalidation of invalid namespace");
            return 0;
        }

        let direct = format!("{namespace}{KEY_SEPARATOR}");
        let subtree = namespace::descendants_prefix(namespace);

        let mut entries = self.entries.lock();
        let doomed: Vec<String> = entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| key.starts_with(&direct) || key.starts_with(&subtree))
            .cloned()
            .collect();

        for key in &doomed {
            entries.pop(key);
        }
        drop(entries);

        self.stats.invalidated(doomed.len() as u64);
        debug!(namespace, removed = doomed.len(), "Invalidated namespace");
        doomed.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }
}

impl<V: Send + Sync + 'static> NamespacedCache<V> {
    /// Subscribe to the invalidation topics of `bus`.
    ///
    /// One task runs per topic until `shutdown` fires. Each message carries
    /// the namespace whose subtree must be dropped.
    pub fn start(
        self: &Arc<Self>,
        bus: &dyn NotificationBus,
        shutdown: ShutdownSignal,
    ) -> Vec<JoinHandle<()>> {
        self.config
            .topics()
            .into_iter()
            .map(|topic| {
                let cache = Arc::clone(self);
                debug!(topic, "Starting cache invalidation");
                spawn_subscription(
                    bus,
                    topic,
                    self.config.subscription_buffer,
                    shutdown.clone(),
                    move |message| match message.data_str() {
                        Some(ns) => {
                            cache.invalidate_namespace(ns);
                        }
                        None => {
                            warn!(kind = %message.kind, "Invalidation message without namespace");
                        }
                    },
                )
            })
            .collect()
    }
}

impl<V> Default for NamespacedCache<V> {
    fn default() -> Self {
        Self::new(NamespacedCacheConfig::default())
    }
}

impl<V> std::fmt::Debug for NamespacedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedCache")
            .field("len", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn test_set_get_delete() {
        let cache = NamespacedCache::default();
        cache.set("/a", "k1", "v1", HOUR);

        assert_eq!(*cache.get("/a", "k1").unwrap().value(), "v1");
        assert!(cache.get("/a", "k2").is_none());
        assert!(cache.get("/b", "k1").is_none());

        assert!(cache.delete("/a", "k1"));
        assert!(!cache.delete("/a", "k1"));
        assert!(cache.get("/a", "k1").is_none());
    }

    #[test]
    fn test_set_replaces_entry() {
        let cache = NamespacedCache::default();
        cache.set("/a", "k", 1, HOUR);
        let first = cache.get("/a", "k").unwrap();

        cache.set("/a", "k", 2, HOUR);
        assert_eq!(*cache.get("/a", "k").unwrap().value(), 2);
        assert_eq!(*first.value(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_expired_entries_are_absent() {
        let cache = NamespacedCache::default();
        cache.set("/a", "k", "v", Duration::ZERO);

        assert!(cache.get("/a", "k").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);
    }

    #[test]
    fn test_lru_eviction_at_capacity() {
        let cache = NamespacedCache::with_capacity(2);
        cache.set("/a", "1", 1, HOUR);
        cache.set("/a", "2", 2, HOUR);

        // Touch "1" so that "2" is the least recently used.
        assert!(cache.get("/a", "1").is_some());
        cache.set("/a", "3", 3, HOUR);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("/a", "1").is_some());
        assert!(cache.get("/a", "2").is_none());
        assert!(cache.get("/a", "3").is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_invalidate_subtree_only() {
        let cache = NamespacedCache::default();
        for ns in ["/", "/a", "/a/b", "/a/b/c", "/ab", "/x"] {
            cache.set(ns, "k", ns.to_string(), HOUR);
        }

        assert_eq!(cache.invalidate_namespace("/a"), 3);

        assert!(cache.get("/a", "k").is_none());
        assert!(cache.get("/a/b", "k").is_none());
        assert!(cache.get("/a/b/c", "k").is_none());
        assert!(cache.get("/", "k").is_some());
        assert!(cache.get("/ab", "k").is_some());
        assert!(cache.get("/x", "k").is_some());
        assert_eq!(cache.stats().invalidations, 3);
    }

    #[test]
    fn test_invalidate_root_clears_everything() {
        let cache = NamespacedCache::default();
        for ns in ["/", "/a", "/a/b"] {
            cache.set(ns, "k", 0, HOUR);
        }

        assert_eq!(cache.invalidate_namespace("/"), 3);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_rejects_invalid_namespaces() {
        let cache = NamespacedCache::default();
        for ns in ["/", "/a", "/x/y"] {
            cache.set(ns, "k", 0, HOUR);
        }

        assert_eq!(cache.invalidate_namespace(""), 0);
        assert_eq!(cache.invalidate_namespace("relative"), 0);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().invalidations, 0);
    }

    #[test]
    fn test_delete_key() {
        let cache = NamespacedCache::default();
        cache.set("/a", "k", 0, HOUR);
        assert!(cache.delete_key("/a:k"));
        assert!(cache.is_empty());
    }
}
