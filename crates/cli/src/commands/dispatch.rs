use super::Outcome;
use crate::loader::PolicyDocument;
use anyhow::{Context, Result};
use nsgate_authz::{ChangeEvent, PushDispatchFilter, PushSession};
use std::path::Path;
use std::sync::Arc;

pub async fn execute(policies: &Path, event: &Path, session: &PushSession) -> Result<Outcome> {
    let authorizer = PolicyDocument::load(policies)?.into_authorizer()?;
    let raw = std::fs::read_to_string(event)
        .with_context(|| format!("unable to read {}", event.display()))?;
    let event: ChangeEvent = serde_json::from_str(&raw).context("invalid change event")?;

    let filter = PushDispatchFilter::new(Arc::new(authorizer));
    let outcome = decide(&filter, session, &event).await?;

    match outcome {
        Outcome::Allowed => println!("dispatch"),
        Outcome::Denied => println!("drop"),
    }
    Ok(outcome)
}

/// Decide whether `event` reaches `session`.
pub async fn decide(
    filter: &PushDispatchFilter,
    session: &PushSession,
    event: &ChangeEvent,
) -> Result<Outcome> {
    let entity = filter.summarize_event(event)?;
    let dispatched = filter.should_dispatch(session, event, &entity).await?;
    Ok(Outcome::from(dispatched))
}
