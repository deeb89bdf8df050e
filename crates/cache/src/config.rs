//! Cache configuration

use nsgate_core::{
    AUTHORIZATION_CHANGES_TOPIC, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_SUBSCRIPTION_BUFFER,
    NAMESPACE_CHANGES_TOPIC,
};
use serde::{Deserialize, Serialize};

/// Configuration of a [`NamespacedCache`](crate::NamespacedCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespacedCacheConfig {
    /// Maximum number of entries before least recently used ones are evicted
    pub max_entries: usize,
    /// Topic carrying namespace change notifications
    pub namespace_topic: String,
    /// Also invalidate on authorization change notifications
    pub invalidate_on_authorization_changes: bool,
    /// Topic carrying authorization change notifications
    pub authorization_topic: String,
    /// Capacity of each subscription queue
    pub subscription_buffer: usize,
}

impl Default for NamespacedCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            namespace_topic: NAMESPACE_CHANGES_TOPIC.to_string(),
            invalidate_on_authorization_changes: false,
            authorization_topic: AUTHORIZATION_CHANGES_TOPIC.to_string(),
            subscription_buffer: DEFAULT_SUBSCRIPTION_BUFFER,
        }
    }
}

impl NamespacedCacheConfig {
    /// Topics the cache listens to for invalidation.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics = vec![self.namespace_topic.as_str()];
        if self.invalidate_on_authorization_changes {
            topics.push(self.authorization_topic.as_str());
        }
        topics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NamespacedCacheConfig::default();
        assert_eq!(config.max_entries, 24_000);
        assert_eq!(config.topics(), vec![NAMESPACE_CHANGES_TOPIC]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: NamespacedCacheConfig = serde_json::from_str(
            r#"{"max_entries": 10, "invalidate_on_authorization_changes": true}"#,
        )
        .unwrap();

        assert_eq!(config.max_entries, 10);
        assert_eq!(config.subscription_buffer, 1024);
        assert_eq!(
            config.topics(),
            vec![NAMESPACE_CHANGES_TOPIC, AUTHORIZATION_CHANGES_TOPIC]
        );
    }
}
