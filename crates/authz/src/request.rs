//! Inbound API request model

use serde::{Deserialize, Serialize};

/// Outcome of [`Authorizer::is_authorized`](crate::Authorizer::is_authorized).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    /// The call may proceed
    Ok,
    /// The call is denied
    Ko,
}

impl AuthAction {
    pub fn is_ok(self) -> bool {
        matches!(self, AuthAction::Ok)
    }
}

impl From<bool> for AuthAction {
    fn from(allowed: bool) -> Self {
        if allowed {
            AuthAction::Ok
        } else {
            AuthAction::Ko
        }
    }
}

/// The parts of an API call the authorizer looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiRequest {
    /// Operation name, such as `retrieve` or `create`
    pub operation: String,
    /// Namespace the call targets
    pub namespace: String,
    /// Resource identity the call targets
    pub resource: String,
    /// Identifier of the targeted object, if any
    pub object_id: String,
    /// Address of the client
    pub source_ip: String,
    /// Raw credential presented by the caller
    pub credential: Option<String>,
    /// Claims extracted from the verified credential
    pub claims: Vec<String>,
}

impl ApiRequest {
    pub fn new(
        operation: impl Into<String>,
        namespace: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            namespace: namespace.into(),
            resource: resource.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn with_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims = claims.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = source_ip.into();
        self
    }

    #[must_use]
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = object_id.into();
        self
    }

    /// The credential, if one was presented and is not blank.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref().filter(|c| !c.trim().is_empty())
    }
}
