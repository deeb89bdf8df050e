//! Permission retrieval capability

mod policy;

pub use policy::{AuthorizationPolicy, PolicyRetriever};

use async_trait::async_trait;
use nsgate_core::{PermissionMap, Restrictions, RetrievalError};

/// Context passed to a [`PermissionRetriever`] along with the claims.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieverOptions {
    /// Address the request comes from, with or without a port
    pub source_ip: String,
    /// Identifier of the targeted object, if any
    pub id: String,
    /// Restrictions carried by the caller's credential
    pub restrictions: Restrictions,
}

impl RetrieverOptions {
    #[must_use]
    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = source_ip.into();
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_restrictions(mut self, restrictions: Restrictions) -> Self {
        self.restrictions = restrictions;
        self
    }
}

/// Resolves the permissions of a set of claims in a namespace.
///
/// Implementations may be remote and must be safe to call concurrently.
/// Errors are handed back to the caller of the authorizer unchanged.
#[async_trait]
pub trait PermissionRetriever: Send + Sync {
    async fn permissions(
        &self,
        claims: &[String],
        namespace: &str,
        options: &RetrieverOptions,
    ) -> Result<PermissionMap, RetrievalError>;
}

#[async_trait]
impl<T: PermissionRetriever + ?Sized> PermissionRetriever for std::sync::Arc<T> {
    async fn permissions(
        &self,
        claims: &[String],
        namespace: &str,
        options: &RetrieverOptions,
    ) -> Result<PermissionMap, RetrievalError> {
        (**self).permissions(claims, namespace, options).await
    }
}
