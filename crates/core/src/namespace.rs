//! Namespace path helpers.
//!
//! A namespace is a slash-delimited path rooted at `/`. Descendants of `N` are
//! exactly the paths prefixed by `N/`, which is what makes prefix-based cache
//! invalidation possible.

use crate::constants::ROOT_NAMESPACE;
use crate::errors::{Error, Result};

/// Validate a namespace given as input to an authorization check.
pub fn validate(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(Error::MissingNamespace);
    }

    if !namespace.starts_with('/') {
        return Err(Error::invalid_namespace(namespace));
    }

    Ok(())
}

/// Returns true if `parent` is a strict ancestor of `child`.
pub fn is_parent_of(parent: &str, child: &str) -> bool {
    if parent.is_empty() || child.is_empty() || parent == child {
        return false;
    }

    if parent == ROOT_NAMESPACE {
        return child.starts_with('/');
    }

    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Returns true if `child` is a strict descendant of `parent`.
pub fn is_child_of(child: &str, parent: &str) -> bool {
    is_parent_of(parent, child)
}

/// Returns the direct parent of `namespace`, or `None` for the root.
pub fn parent_of(namespace: &str) -> Option<&str> {
    if namespace == ROOT_NAMESPACE || namespace.is_empty() {
        return None;
    }

    match namespace.rfind('/') {
        Some(0) => Some(ROOT_NAMESPACE),
        Some(idx) => Some(&namespace[..idx]),
        None => None,
    }
}

/// Iterate over the strict ancestors of `namespace`, closest first.
pub fn ancestors(namespace: &str) -> impl Iterator<Item = &str> {
    std::iter::successors(parent_of(namespace), |ns| parent_of(ns))
}

/// Prefix matching every key of the descendants of `namespace`.
///
/// The root already ends with the separator, so no extra slash is added.
pub fn descendants_prefix(namespace: &str) -> String {
    if namespace == ROOT_NAMESPACE {
        ROOT_NAMESPACE.to_string()
    } else {
        format!("{namespace}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_validate() {
        assert!(matches!(validate(""), Err(Error::MissingNamespace)));
        assert!(matches!(
            validate("no-leading-slash"),
            Err(Error::InvalidNamespace { .. })
        ));
        assert!(validate("/").is_ok());
        assert!(validate("/a/b").is_ok());
    }

    #[test]
    fn test_relations() {
        assert!(is_parent_of("/", "/a"));
        assert!(is_parent_of("/a", "/a/b"));
        assert!(is_parent_of("/a", "/a/b/c"));
        assert!(!is_parent_of("/a", "/a"));
        assert!(!is_parent_of("/a", "/ab"));
        assert!(!is_parent_of("/a/b", "/a"));
        assert!(!is_parent_of("/", "/"));
        assert!(is_child_of("/a/b", "/a"));
        assert!(!is_child_of("/a/c", "/a/b"));
    }

    #[test]
    fn test_parent_and_ancestors() {
        assert_eq!(parent_of("/"), None);
        assert_eq!(parent_of("/a"), Some("/"));
        assert_eq!(parent_of("/a/b"), Some("/a"));
        assert_eq!(
            ancestors("/a/b/c").collect::<Vec<_>>(),
            vec!["/a/b", "/a", "/"]
        );
    }

    #[test]
    fn test_descendants_prefix() {
        assert_eq!(descendants_prefix("/"), "/");
        assert_eq!(descendants_prefix("/a"), "/a/");
    }

    proptest! {
        #[test]
        fn every_ancestor_is_a_parent(segments in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
            let ns = format!("/{}", segments.join("/"));
            for ancestor in ancestors(&ns) {
                prop_assert!(is_parent_of(ancestor, &ns));
                prop_assert!(!is_parent_of(&ns, ancestor));
            }
        }
    }
}
