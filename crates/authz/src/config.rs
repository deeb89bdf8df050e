//! Authorizer configuration

use nsgate_cache::NamespacedCacheConfig;
use nsgate_core::{Error, Result, DEFAULT_CACHE_TTL, DEFAULT_CACHE_TTL_JITTER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Configuration of an [`Authorizer`](crate::Authorizer).
///
/// Durations are expressed in seconds when (de)serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Resources that are always authorized
    pub ignored_resources: BTreeSet<String>,
    /// Base lifetime of a cached permission map
    #[serde(with = "duration_secs")]
    pub cache_ttl: Duration,
    /// Exclusive upper bound of the random delay added to `cache_ttl`
    #[serde(with = "duration_secs")]
    pub cache_ttl_jitter: Duration,
    /// Decision cache settings
    pub cache: NamespacedCacheConfig,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            ignored_resources: BTreeSet::new(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_ttl_jitter: DEFAULT_CACHE_TTL_JITTER,
            cache: NamespacedCacheConfig::default(),
        }
    }
}

impl AuthorizerConfig {
    /// Load a configuration from JSON. Missing fields take their default.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|e| Error::decode("authorizer configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(Error::configuration("cache.max_entries must be greater than 0"));
        }

        if self.cache.subscription_buffer == 0 {
            return Err(Error::configuration(
                "cache.subscription_buffer must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn is_ignored(&self, resource: &str) -> bool {
        self.ignored_resources.contains(resource)
    }
}

/// Builder for [`AuthorizerConfig`]
#[derive(Debug, Default)]
pub struct AuthorizerConfigBuilder {
    config: AuthorizerConfig,
}

impl AuthorizerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add resources that bypass authorization
    #[must_use]
    pub fn ignore_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config
            .ignored_resources
            .extend(resources.into_iter().map(Into::into));
        self
    }

    /// Set the base cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Set the TTL jitter bound
    #[must_use]
    pub fn with_cache_ttl_jitter(mut self, jitter: Duration) -> Self {
        self.config.cache_ttl_jitter = jitter;
        self
    }

    /// Set the maximum number of cached permission maps
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.config.cache.max_entries = max_entries;
        self
    }

    /// Use a custom namespace change topic
    #[must_use]
    pub fn with_namespace_topic(mut self, topic: impl Into<String>) -> Self {
        self.config.cache.namespace_topic = topic.into();
        self
    }

    /// Also invalidate the cache on authorization change notifications
    #[must_use]
    pub fn invalidate_on_authorization_changes(mut self, enabled: bool) -> Self {
        self.config.cache.invalidate_on_authorization_changes = enabled;
        self
    }

    /// Set the capacity of subscription queues
    #[must_use]
    pub fn with_subscription_buffer(mut self, capacity: usize) -> Self {
        self.config.cache.subscription_buffer = capacity;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AuthorizerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthorizerConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.cache_ttl_jitter, Duration::from_secs(1800));
        assert_eq!(config.cache.max_entries, 24_000);
        assert!(config.ignored_resources.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = AuthorizerConfigBuilder::new()
            .ignore_resources(["root", "issue"])
            .with_cache_ttl(Duration::from_secs(10))
            .with_max_entries(5)
            .invalidate_on_authorization_changes(true)
            .build()
            .unwrap();

        assert!(config.is_ignored("root"));
        assert!(config.is_ignored("issue"));
        assert!(!config.is_ignored("things"));
        assert_eq!(config.cache_ttl, Duration::from_secs(10));
        assert_eq!(config.cache.max_entries, 5);
        assert!(config.cache.invalidate_on_authorization_changes);
    }

    #[test]
    fn test_builder_rejects_zero_capacity() {
        let err = AuthorizerConfigBuilder::new()
            .with_max_entries(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_entries"));
    }

    #[test]
    fn test_from_json() {
        let config = AuthorizerConfig::from_json(
            r#"{"ignored_resources": ["root"], "cache_ttl": 60, "cache": {"max_entries": 10}}"#,
        )
        .unwrap();

        assert!(config.is_ignored("root"));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.cache_ttl_jitter, Duration::from_secs(1800));
        assert_eq!(config.cache.max_entries, 10);

        assert!(AuthorizerConfig::from_json("{").is_err());
    }
}
