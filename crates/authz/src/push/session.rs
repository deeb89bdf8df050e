use std::collections::HashMap;

/// Session parameter holding the subscribed namespace.
pub const NAMESPACE_PARAMETER: &str = "namespace";

/// Session parameter selecting the delivery mode.
pub const MODE_PARAMETER: &str = "mode";

/// Mode value enabling delivery of events from descendant namespaces.
pub const RECURSIVE_MODE: &str = "all";

/// A long-lived subscriber session receiving change events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushSession {
    pub claims: Vec<String>,
    pub credential: String,
    pub client_ip: String,
    pub parameters: HashMap<String, String>,
}

impl PushSession {
    pub fn new(namespace: impl Into<String>) -> Self {
        let mut session = Self::default();
        session
            .parameters
            .insert(NAMESPACE_PARAMETER.to_string(), namespace.into());
        session
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
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = credential.into();
        self
    }

    #[must_use]
    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        self.client_ip = client_ip.into();
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn recursive(self) -> Self {
        self.with_parameter(MODE_PARAMETER, RECURSIVE_MODE)
    }

    /// Value of a parameter, empty when absent.
    pub fn parameter(&self, name: &str) -> &str {
        self.parameters.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.parameter(NAMESPACE_PARAMETER)
    }

    pub fn is_recursive(&self) -> bool {
        self.parameter(MODE_PARAMETER) == RECURSIVE_MODE
    }
}
