//! Restriction extraction from caller credentials

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use nsgate_core::{Error, Restrictions, Result};
use serde_json::Value;
use std::sync::Arc;

/// Derives the [`Restrictions`] embedded in a credential.
pub trait RestrictionExtractor: Send + Sync {
    /// Fails with [`Error::InvalidCredential`] when the credential cannot be
    /// parsed.
    fn restrictions(&self, credential: &str) -> Result<Restrictions>;
}

impl<T: RestrictionExtractor + ?Sized> RestrictionExtractor for Arc<T> {
    fn restrictions(&self, credential: &str) -> Result<Restrictions> {
        (**self).restrictions(credential)
    }
}

/// Reads the `restrictions` claim of a JWT.
///
/// The token signature is not verified: tokens reaching the authorizer have
/// already been authenticated upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsRestrictionExtractor;

impl ClaimsRestrictionExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract(token: &str) -> std::result::Result<Restrictions, String> {
        let claims = unverified_claims(token)?;

        let Some(raw) = claims.get("restrictions") else {
            return Ok(Restrictions::default());
        };

        let Value::Object(restrictions) = raw else {
            return Ok(Restrictions::default());
        };

        let namespace = match restrictions.get("namespace") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(ns)) => ns.clone(),
            Some(_) => return Err("invalid restrictions.namespace claim type".to_string()),
        };

        Ok(Restrictions {
            namespace,
            permissions: string_list(restrictions.get("perms"), "permissions")?,
            networks: string_list(restrictions.get("networks"), "networks")?,
        })
    }
}

impl RestrictionExtractor for ClaimsRestrictionExtractor {
    fn restrictions(&self, credential: &str) -> Result<Restrictions> {
        Self::extract(credential).map_err(|message| {
            Error::invalid_credential(format!(
                "unable to compute authz restrictions from token: {message}"
            ))
        })
    }
}

fn unverified_claims(token: &str) -> std::result::Result<serde_json::Map<String, Value>, String> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err("token contains an invalid number of segments".to_string()),
    };

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| format!("unable to decode token payload: {e}"))?;

    serde_json::from_slice(&decoded).map_err(|e| format!("unable to parse token claims: {e}"))
}

fn string_list(value: Option<&Value>, field: &str) -> std::result::Result<Vec<String>, String> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(format!("invalid restrictions.{field} claim type")),
    };

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| format!("invalid restrictions.{field} claim item type"))
        })
        .collect()
}

/// Build an unsigned JWT carrying `claims`. Used by tests and tooling.
pub fn encode_unsigned_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.")
}
