use super::Outcome;
use crate::loader::PolicyDocument;
use anyhow::Result;
use nsgate_authz::{ApiRequest, Authorizer, CheckOptions};
use std::path::Path;
use tracing::Instrument;

/// A single authorization question asked from the command line.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    pub namespace: String,
    pub resource: String,
    pub operation: String,
    pub claims: Vec<String>,
    pub source_ip: Option<String>,
    pub id: Option<String>,
    pub token: Option<String>,
}

pub async fn execute(policies: &Path, request: CheckRequest) -> Result<Outcome> {
    let authorizer = PolicyDocument::load(policies)?.into_authorizer()?;
    let outcome = decide(&authorizer, &request).await?;

    match outcome {
        Outcome::Allowed => println!("allowed"),
        Outcome::Denied => println!("denied"),
    }
    Ok(outcome)
}

/// Answer `request` with `authorizer`.
///
/// With a token the request goes through the full API path, so the token
/// restrictions apply. Without one the claims are checked directly.
pub async fn decide(authorizer: &Authorizer, request: &CheckRequest) -> Result<Outcome> {
    let span = nsgate_utils::decision_span(&request.namespace, &request.resource, &request.operation);

    let allowed = async {
        match &request.token {
            Some(token) => {
                let mut api = ApiRequest::new(
                    request.operation.as_str(),
                    request.namespace.as_str(),
                    request.resource.as_str(),
                )
                .with_credential(token.as_str())
                .with_claims(request.claims.iter().cloned());
                if let Some(source_ip) = &request.source_ip {
                    api = api.with_source_ip(source_ip.as_str());
                }
                if let Some(id) = &request.id {
                    api = api.with_object_id(id.as_str());
                }
                authorizer.is_authorized(&api).await.map(|action| action.is_ok())
            }
            None => {
                let mut options = CheckOptions::default();
                if let Some(source_ip) = &request.source_ip {
                    options = options.with_source_ip(source_ip.as_str());
                }
                if let Some(id) = &request.id {
                    options = options.with_id(id.as_str());
                }
                authorizer
                    .check_authorization(
                        &request.claims,
                        &request.operation,
                        &request.namespace,
                        &request.resource,
                        &options,
                    )
                    .await
            }
        }
    }
    .instrument(span.clone())
    .await?;

    span.in_scope(|| nsgate_utils::decision_outcome(allowed));
    Ok(Outcome::from(allowed))
}
