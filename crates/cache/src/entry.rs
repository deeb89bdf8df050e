//! Cache entries

use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cached value with its expiration deadline.
///
/// Entries are immutable. Refreshing a value replaces the whole entry.
#[derive(Debug)]
pub struct CacheEntry<V> {
    value: Arc<V>,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value: Arc::new(value),
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    /// Remaining time to live.
    pub fn ttl(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}
