use nsgate_cache::{cache_key, composite_key};
use nsgate_core::Restrictions;

/// Composite key under which the decision for this context is cached.
pub fn render(namespace: &str, claims: &[String], source_ip: &str, id: &str) -> String {
    let key = cache_key(claims, source_ip, id, &Restrictions::default());
    composite_key(namespace, &key)
}
