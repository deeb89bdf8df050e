//! Loading of policy documents

use anyhow::{Context, Result};
use nsgate_authz::{AuthorizationPolicy, Authorizer, AuthorizerConfig, PolicyRetriever};
use serde::Deserialize;
use std::path::Path;

/// A policy document as read from disk.
///
/// Either a bare array of policies, or an object carrying the policies along
/// with the list of existing namespaces and the authorizer configuration.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PolicyDocument {
    Policies(Vec<AuthorizationPolicy>),
    Full {
        policies: Vec<AuthorizationPolicy>,
        #[serde(default)]
        namespaces: Option<Vec<String>>,
        #[serde(default)]
        config: AuthorizerConfig,
    },
}

impl PolicyDocument {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("invalid policy document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("unable to load {}", path.display()))
    }

    /// Build an authorizer answering from the document's policies.
    pub fn into_authorizer(self) -> Result<Authorizer> {
        let (retriever, config) = match self {
            PolicyDocument::Policies(policies) => {
                (PolicyRetriever::new(policies), AuthorizerConfig::default())
            }
            PolicyDocument::Full {
                policies,
                namespaces,
                config,
            } => {
                let retriever = PolicyRetriever::new(policies);
                let retriever = match namespaces {
                    Some(namespaces) => retriever.with_namespaces(namespaces),
                    None => retriever,
                };
                (retriever, config)
            }
        };

        config.validate()?;
        Ok(Authorizer::builder(retriever).config(config).build()?)
    }
}

/// Parse `key=value` claims, rejecting anything else.
pub fn parse_claim(raw: &str) -> std::result::Result<String, String> {
    match raw.split_once('=') {
        Some((key, _)) if !key.is_empty() => Ok(raw.to_string()),
        _ => Err(format!("claim '{raw}' must be of the form key=value")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_array_document() {
        let doc = PolicyDocument::from_json(
            r#"[{"name": "p", "namespace": "/a", "subject": [["team=red"]], "targetNamespaces": ["/a"], "permissions": ["things:get"]}]"#,
        )
        .unwrap();
        assert!(matches!(doc, PolicyDocument::Policies(ref p) if p.len() == 1));
        assert!(doc.into_authorizer().is_ok());
    }

    #[test]
    fn test_full_document_with_config() {
        let doc = PolicyDocument::from_json(
            r#"{"policies": [], "namespaces": ["/a"], "config": {"ignored_resources": ["root"]}}"#,
        )
        .unwrap();
        let authorizer = doc.into_authorizer().unwrap();
        assert!(authorizer.config().is_ignored("root"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let doc = PolicyDocument::from_json(
            r#"{"policies": [], "config": {"cache": {"max_entries": 0}}}"#,
        )
        .unwrap();
        assert!(doc.into_authorizer().is_err());
    }

    #[test]
    fn test_parse_claim() {
        assert_eq!(parse_claim("team=red").unwrap(), "team=red");
        assert_eq!(parse_claim("@issuer=x=y").unwrap(), "@issuer=x=y");
        assert!(parse_claim("team").is_err());
        assert!(parse_claim("=red").is_err());
    }
}
