//! Permission maps: resource identity -> operation -> allowed.

use crate::constants::WILDCARD;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Operations granted on one resource.
pub type Permissions = HashMap<String, bool>;

/// Resolved allow/deny table for an identity in a namespace.
///
/// The `*` key acts as a wildcard both for resources and for operations.
/// Missing entries deny.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMap(HashMap<String, Permissions>);

impl PermissionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `operations` on `resource`, merging with existing grants.
    pub fn grant<I, S>(&mut self, resource: impl Into<String>, operations: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.0.entry(resource.into()).or_default();
        for op in operations {
            entry.insert(op.into(), true);
        }
    }

    /// Builder-style variant of [`PermissionMap::grant`].
    #[must_use]
    pub fn with<I, S>(mut self, resource: impl Into<String>, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grant(resource, operations);
        self
    }

    /// Returns true if `operation` on `resource` is granted.
    pub fn allows(&self, operation: &str, resource: &str) -> bool {
        let granted = |perms: &Permissions| {
            perms.get(WILDCARD).copied().unwrap_or(false)
                || perms.get(operation).copied().unwrap_or(false)
        };

        if self.0.get(WILDCARD).is_some_and(granted) {
            return true;
        }

        self.0.get(resource).is_some_and(granted)
    }

    /// Parse permission entries of the form `resource:op1,op2[:id1,id2]`.
    ///
    /// When an id list is present the entry only applies if `target_id` is
    /// one of the ids. Entries without an operation list are skipped.
    pub fn parse<S: AsRef<str>>(entries: &[S], target_id: &str) -> Self {
        let mut out = Self::new();

        for entry in entries {
            let mut parts = entry.as_ref().splitn(3, ':');
            let resource = parts.next().unwrap_or_default().trim();
            let Some(ops) = parts.next() else {
                continue;
            };

            if resource.is_empty() {
                continue;
            }

            if let Some(ids) = parts.next() {
                if !ids.split(',').map(str::trim).any(|id| id == target_id) {
                    continue;
                }
            }

            out.grant(
                resource,
                ops.split(',').map(str::trim).filter(|op| !op.is_empty()),
            );
        }

        out
    }

    /// The grants allowed by both `self` and `other`.
    ///
    /// Wildcards on either side are expanded against the explicit entries
    /// of the other side. Resources left without any operation are dropped.
    pub fn intersect(&self, other: &PermissionMap) -> PermissionMap {
        if self.is_empty() || other.is_empty() {
            return PermissionMap::new();
        }

        let resources: HashSet<&String> = self.0.keys().chain(other.0.keys()).collect();
        let mut out = PermissionMap::new();

        for resource in resources {
            let ours = self.effective(resource);
            let theirs = other.effective(resource);

            let ops: HashSet<&String> = ours.keys().chain(theirs.keys()).collect();
            let granted: Vec<String> = ops
                .into_iter()
                .filter(|op| allows_op(&ours, op) && allows_op(&theirs, op))
                .cloned()
                .collect();

            if !granted.is_empty() {
                out.grant(resource.clone(), granted);
            }
        }

        out
    }

    /// Returns true if every grant of `other` is also granted by `self`.
    ///
    /// An empty receiver contains nothing.
    pub fn contains(&self, other: &PermissionMap) -> bool {
        if self.is_empty() {
            return false;
        }

        other.0.iter().all(|(resource, ops)| {
            let known = self.0.contains_key(resource) || self.0.contains_key(WILDCARD);
            known
                && ops
                    .iter()
                    .filter(|(_, allowed)| **allowed)
                    .all(|(op, _)| self.allows(op, resource))
        })
    }

    pub fn get(&self, resource: &str) -> Option<&Permissions> {
        self.0.get(resource)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Permissions)> {
        self.0.iter()
    }

    /// Granted operations for `resource`, merged with the wildcard resource.
    fn effective(&self, resource: &str) -> Permissions {
        let mut merged = Permissions::new();
        for source in [self.0.get(WILDCARD), self.0.get(resource)]
            .into_iter()
            .flatten()
        {
            for (op, allowed) in source {
                if *allowed {
                    merged.insert(op.clone(), true);
                }
            }
        }
        merged
    }
}

fn allows_op(perms: &Permissions, op: &str) -> bool {
    if op == WILDCARD {
        return perms.get(WILDCARD).copied().unwrap_or(false);
    }
    perms.get(op).copied().unwrap_or(false) || perms.get(WILDCARD).copied().unwrap_or(false)
}

impl From<HashMap<String, Permissions>> for PermissionMap {
    fn from(map: HashMap<String, Permissions>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Permissions)> for PermissionMap {
    fn from_iter<T: IntoIterator<Item = (String, Permissions)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows() {
        let perms = PermissionMap::new()
            .with("things", ["get", "post"])
            .with("others", ["*"]);

        assert!(perms.allows("get", "things"));
        assert!(perms.allows("post", "things"));
        assert!(!perms.allows("delete", "things"));
        assert!(perms.allows("delete", "others"));
        assert!(!perms.allows("get", "missing"));
        assert!(!PermissionMap::new().allows("get", "things"));
    }

    #[test]
    fn test_allows_wildcard_resource() {
        let perms = PermissionMap::new().with("*", ["get"]);
        assert!(perms.allows("get", "anything"));
        assert!(!perms.allows("post", "anything"));

        let admin = PermissionMap::new().with("*", ["*"]);
        assert!(admin.allows("delete", "anything"));
    }

    #[test]
    fn test_explicit_false_denies() {
        let mut raw = HashMap::new();
        raw.insert(
            "things".to_string(),
            Permissions::from([("get".to_string(), false)]),
        );
        let perms = PermissionMap::from(raw);
        assert!(!perms.allows("get", "things"));
    }

    #[test]
    fn test_parse() {
        let perms = PermissionMap::parse(
            &[
                "things:get,post",
                "things:delete",
                "secrets:get:id1,id2",
                "hidden:get:id3",
                "garbage",
            ],
            "id1",
        );

        assert!(perms.allows("get", "things"));
        assert!(perms.allows("delete", "things"));
        assert!(perms.allows("get", "secrets"));
        assert!(!perms.allows("get", "hidden"));
        assert!(perms.get("garbage").is_none());
        assert_eq!(perms.len(), 2);
    }

    #[test]
    fn test_intersect() {
        let base = PermissionMap::new()
            .with("things", ["get", "post"])
            .with("others", ["*"]);
        let restriction = PermissionMap::new()
            .with("things", ["get"])
            .with("others", ["delete"])
            .with("unrelated", ["get"]);

        let out = base.intersect(&restriction);
        assert!(out.allows("get", "things"));
        assert!(!out.allows("post", "things"));
        assert!(out.allows("delete", "others"));
        assert!(!out.allows("get", "others"));
        assert!(!out.allows("get", "unrelated"));
    }

    #[test]
    fn test_intersect_with_wildcards() {
        let admin = PermissionMap::new().with("*", ["*"]);
        let restriction = PermissionMap::new().with("things", ["get"]);

        let out = admin.intersect(&restriction);
        assert!(out.allows("get", "things"));
        assert!(!out.allows("post", "things"));
        assert!(!out.allows("get", "others"));

        let reads = PermissionMap::new().with("*", ["get"]);
        let out = reads.intersect(&PermissionMap::new().with("things", ["get", "post"]));
        assert!(out.allows("get", "things"));
        assert!(!out.allows("post", "things"));

        assert!(admin.intersect(&PermissionMap::new()).is_empty());
    }

    #[test]
    fn test_contains() {
        let base = PermissionMap::new()
            .with("things", ["get", "post"])
            .with("others", ["*"]);

        assert!(base.contains(&PermissionMap::new().with("things", ["get"])));
        assert!(base.contains(&PermissionMap::new().with("others", ["delete"])));
        assert!(!base.contains(&PermissionMap::new().with("things", ["delete"])));
        assert!(!base.contains(&PermissionMap::new().with("missing", ["get"])));
        assert!(!PermissionMap::new().contains(&PermissionMap::new()));

        let admin = PermissionMap::new().with("*", ["*"]);
        assert!(admin.contains(&base));
    }

    #[test]
    fn test_serde_transparent() {
        let perms = PermissionMap::new().with("things", ["get"]);
        let json = serde_json::to_string(&perms).unwrap();
        assert_eq!(json, r#"{"things":{"get":true}}"#);
        let back: PermissionMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, perms);
    }
}
