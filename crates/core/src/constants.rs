//! Shared constants: notification topics, well-known identities and defaults.

use std::time::Duration;

/// Topic carrying namespace change notifications. The payload data is the
/// namespace path whose subtree must be invalidated.
pub const NAMESPACE_CHANGES_TOPIC: &str = "notifications.changes.namespace";

/// Topic carrying authorization policy change notifications.
pub const AUTHORIZATION_CHANGES_TOPIC: &str = "notifications.changes.authorization";

/// Identity of namespace objects in change events.
pub const NAMESPACE_IDENTITY: &str = "namespace";

/// Identity of authorization policy objects in change events.
pub const AUTHORIZATION_IDENTITY: &str = "authorization";

/// Pseudo-resource checked when a push session is opened.
pub const PUSH_SESSION_IDENTITY: &str = "pushsession";

/// Component name rendered in forbidden-class errors.
pub const AUTHORIZER_COMPONENT: &str = "nsgate:authorizer";

/// Root of the namespace tree.
pub const ROOT_NAMESPACE: &str = "/";

/// Separator between a namespace and a key in composite cache keys.
pub const KEY_SEPARATOR: char = ':';

/// Wildcard used in permission maps for "any resource" and "any operation".
pub const WILDCARD: &str = "*";

/// Default maximum number of cached permission maps.
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 24_000;

/// Default base lifetime of a cached permission map.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// Default upper bound (exclusive) of the random jitter added to the TTL.
pub const DEFAULT_CACHE_TTL_JITTER: Duration = Duration::from_secs(30 * 60);

/// Default capacity of the per-subscription delivery queue.
pub const DEFAULT_SUBSCRIPTION_BUFFER: usize = 1024;
