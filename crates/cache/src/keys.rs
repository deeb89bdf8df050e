//! Cache key derivation

use nsgate_core::{Restrictions, KEY_SEPARATOR};
use xxhash_rust::xxh3::Xxh3;

/// Digest of the identity and context of a decision.
///
/// The digest is order sensitive and every field is length prefixed, so
/// `["a:b"]` and `["a", "b"]` hash differently. It is rendered as a decimal
/// string, which never contains the key separator.
pub fn cache_key<S: AsRef<str>>(
    claims: &[S],
    source_ip: &str,
    id: &str,
    restrictions: &Restrictions,
) -> String {
    let mut hasher = Xxh3::new();

    write_list(&mut hasher, claims);
    write_field(&mut hasher, source_ip);
    write_field(&mut hasher, id);
    write_field(&mut hasher, &restrictions.namespace);
    write_list(&mut hasher, &restrictions.networks);
    write_list(&mut hasher, &restrictions.permissions);

    hasher.digest().to_string()
}

/// Flat key of `key` stored under `namespace`.
pub fn composite_key(namespace: &str, key: &str) -> String {
    let mut out = String::with_capacity(namespace.len() + key.len() + 1);
    out.push_str(namespace);
    out.push(KEY_SEPARATOR);
    out.push_str(key);
    out
}

/// Split a composite key back into namespace and key.
///
/// Keys never contain the separator, so the last one delimits them.
pub fn split_composite_key(composite: &str) -> Option<(&str, &str)> {
    composite.rsplit_once(KEY_SEPARATOR)
}

fn write_field(hasher: &mut Xxh3, value: &str) {
    hasher.update(&(value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn write_list<S: AsRef<str>>(hasher: &mut Xxh3, values: &[S]) {
    hasher.update(&(values.len() as u64).to_le_bytes());
    for value in values {
        write_field(hasher, value.as_ref());
    }
}
