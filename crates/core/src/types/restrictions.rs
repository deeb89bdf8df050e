//! Caller restrictions narrowing what a credential's claims may do.

use super::network::Cidr;
use super::permissions::PermissionMap;
use crate::errors::{Error, Result};
use crate::namespace;
use serde::{Deserialize, Serialize};

/// Restrictions embedded in a credential. Empty fields mean unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Restrictions {
    /// Namespace the credential is confined to.
    #[serde(default)]
    pub namespace: String,
    /// Source networks (CIDR) the credential may be used from.
    #[serde(default)]
    pub networks: Vec<String>,
    /// Permission subset, as `resource:op1,op2[:ids]` entries.
    #[serde(default, rename = "perms")]
    pub permissions: Vec<String>,
}

impl Restrictions {
    pub fn is_empty(&self) -> bool {
        self.namespace.is_empty() && self.networks.is_empty() && self.permissions.is_empty()
    }

    /// Resolve the permission subset into a map for `target_id`.
    pub fn permission_map(&self, target_id: &str) -> PermissionMap {
        PermissionMap::parse(&self.permissions, target_id)
    }

    /// Parse the network restrictions.
    pub fn parsed_networks(&self) -> Result<Vec<Cidr>> {
        self.networks.iter().map(|n| n.parse()).collect()
    }

    /// Namespace restriction to use when deriving a credential that requests
    /// `requested`. The result can only be equal to or below the receiver.
    pub fn compute_namespace_restriction(&self, requested: &str) -> Result<String> {
        if self.namespace.is_empty() || namespace::is_child_of(requested, &self.namespace) {
            return Ok(requested.to_string());
        }

        if requested.is_empty() || self.namespace == requested {
            return Ok(self.namespace.clone());
        }

        Err(Error::restriction(format!(
            "the new namespace restriction must be empty, '{}' or one of its children",
            self.namespace
        )))
    }

    /// Network restrictions to use when deriving a credential that requests
    /// `requested`. Every requested network must fit in one of ours.
    pub fn compute_network_restrictions(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.networks.clone());
        }

        if self.networks.is_empty() {
            return Ok(requested.to_vec());
        }

        let ours = self.parsed_networks()?;
        for candidate in requested {
            let sub: Cidr = candidate.parse()?;
            if !ours.iter().any(|net| net.contains_network(&sub)) {
                return Err(Error::restriction(
                    "the new network restrictions must not overlap any of the original ones",
                ));
            }
        }

        Ok(requested.to_vec())
    }

    /// Permission restrictions to use when deriving a credential that
    /// requests `requested`. The request must not be broader than ours.
    pub fn compute_permissions_restrictions(&self, requested: &[String]) -> Result<Vec<String>> {
        if requested.is_empty() {
            return Ok(self.permissions.clone());
        }

        if self.permissions.is_empty() {
            return Ok(requested.to_vec());
        }

        let ours = PermissionMap::parse(&self.permissions, "");
        let theirs = PermissionMap::parse(requested, "");
        if !ours.contains(&theirs) {
            return Err(Error::restriction(
                "the new permissions restrictions must not be broader than the existing ones",
            ));
        }

        Ok(requested.to_vec())
    }
}
