//! In-memory policy store implementing [`PermissionRetriever`].

use super::{PermissionRetriever, RetrieverOptions};
use async_trait::async_trait;
use nsgate_core::types::normalize_source_ip;
use nsgate_core::{namespace, Cidr, PermissionMap, RetrievalError, ROOT_NAMESPACE};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use tracing::debug;

const ISSUER_CLAIM_PREFIX: &str = "@issuer=";

/// An authorization policy granting permissions to matching subjects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthorizationPolicy {
    pub name: String,
    /// Namespace the policy is defined in
    pub namespace: String,
    /// Make the policy visible from the descendants of its namespace
    pub propagate: bool,
    pub disabled: bool,
    /// OR of AND claim sets. A subject matches when all the claims of at
    /// least one set are present.
    pub subject: Vec<Vec<String>>,
    /// Namespaces, with their descendants, where the permissions apply
    pub target_namespaces: Vec<String>,
    /// Source networks the policy is restricted to
    pub subnets: Vec<String>,
    /// Granted permissions, as `resource:op1,op2[:ids]` entries
    pub permissions: Vec<String>,
    /// Issuers allowed to produce the matching claims
    pub trusted_issuers: Vec<String>,
}

impl AuthorizationPolicy {
    /// True when one of the claim sets is fully contained in `claims`.
    pub fn matches(&self, claims: &[String]) -> bool {
        self.subject
            .iter()
            .filter(|ands| !ands.is_empty())
            .any(|ands| ands.iter().all(|c| claims.contains(c)))
    }

    fn is_visible_from(&self, ns: &str) -> bool {
        self.namespace == ns || (self.propagate && namespace::is_parent_of(&self.namespace, ns))
    }

    fn targets(&self, ns: &str) -> bool {
        self.target_namespaces
            .iter()
            .any(|target| target == ns || namespace::is_child_of(ns, target))
    }

    fn trusts(&self, issuer: Option<&str>) -> bool {
        match issuer {
            Some(issuer) => self.trusted_issuers.iter().any(|t| t == issuer),
            None => true,
        }
    }
}

/// Resolves permissions from a set of [`AuthorizationPolicy`] held in memory.
///
/// When a namespace registry is configured, unknown namespaces resolve to an
/// empty permission map so that their existence is not revealed.
#[derive(Debug, Default)]
pub struct PolicyRetriever {
    policies: RwLock<Vec<AuthorizationPolicy>>,
    namespaces: Option<RwLock<BTreeSet<String>>>,
}

impl PolicyRetriever {
    pub fn new(policies: Vec<AuthorizationPolicy>) -> Self {
        Self {
            policies: RwLock::new(policies),
            namespaces: None,
        }
    }

    /// Only resolve permissions in the given namespaces.
    #[must_use]
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = Some(RwLock::new(namespaces.into_iter().map(Into::into).collect()));
        self
    }

    pub fn add_policy(&self, policy: AuthorizationPolicy) {
        self.policies.write().push(policy);
    }

    /// Remove the policies named `name`. Returns how many were removed.
    pub fn remove_policy(&self, name: &str) -> usize {
        let mut policies = self.policies.write();
        let before = policies.len();
        policies.retain(|p| p.name != name);
        before - policies.len()
    }

    pub fn add_namespace(&self, ns: impl Into<String>) {
        if let Some(namespaces) = &self.namespaces {
            namespaces.write().insert(ns.into());
        }
    }

    pub fn remove_namespace(&self, ns: &str) {
        if let Some(namespaces) = &self.namespaces {
            namespaces.write().remove(ns);
        }
    }

    fn namespace_exists(&self, ns: &str) -> bool {
        match &self.namespaces {
            Some(namespaces) => ns == ROOT_NAMESPACE || namespaces.read().contains(ns),
            None => true,
        }
    }
}

#[async_trait]
impl PermissionRetriever for PolicyRetriever {
    async fn permissions(
        &self,
        claims: &[String],
        ns: &str,
        options: &RetrieverOptions,
    ) -> Result<PermissionMap, RetrievalError> {
        let restrictions = &options.restrictions;

        if !restrictions.namespace.is_empty()
            && restrictions.namespace != ns
            && !namespace::is_parent_of(&restrictions.namespace, ns)
        {
            debug!(namespace = ns, restriction = %restrictions.namespace, "Namespace outside of restriction");
            return Ok(PermissionMap::new());
        }

        if !self.namespace_exists(ns) {
            return Ok(PermissionMap::new());
        }

        let issuer = claims
            .iter()
            .find_map(|c| c.strip_prefix(ISSUER_CLAIM_PREFIX));

        let matching: Vec<AuthorizationPolicy> = self
            .policies
            .read()
            .iter()
            .filter(|p| !p.disabled && p.is_visible_from(ns) && p.trusts(issuer))
            .filter(|p| p.matches(claims) && p.targets(ns))
            .cloned()
            .collect();

        let mut out = PermissionMap::new();
        for policy in &matching {
            if !policy.subnets.is_empty() && !source_in(&options.source_ip, &policy.subnets)? {
                continue;
            }

            for (resource, ops) in PermissionMap::parse(&policy.permissions, &options.id).iter() {
                out.grant(
                    resource.clone(),
                    ops.iter().filter(|(_, allowed)| **allowed).map(|(op, _)| op.clone()),
                );
            }
        }

        if !restrictions.permissions.is_empty() {
            out = out.intersect(&restrictions.permission_map(&options.id));
        }

        if !restrictions.networks.is_empty() && !source_in(&options.source_ip, &restrictions.networks)? {
            return Ok(PermissionMap::new());
        }

        Ok(out)
    }
}

fn source_in(source_ip: &str, networks: &[String]) -> Result<bool, RetrievalError> {
    let ip: IpAddr = normalize_source_ip(source_ip).map_err(RetrievalError::new)?;
    for network in networks {
        let cidr: Cidr = network.parse().map_err(RetrievalError::new)?;
        if cidr.contains(&ip) {
            return Ok(true);
        }
    }
    Ok(false)
}
