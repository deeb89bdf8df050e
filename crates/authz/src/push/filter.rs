//! Dispatch decisions for push sessions

use super::event::{ChangeEvent, EventType, PushedEntity};
use super::session::PushSession;
use crate::authorizer::{Authorizer, CheckOptions};
use nsgate_core::{namespace, Result, NAMESPACE_IDENTITY, PUSH_SESSION_IDENTITY};
use std::sync::Arc;
use tracing::{debug, error};

const READ_OPERATION: &str = "get";

/// Decides which change events reach which push sessions.
///
/// An event goes through three gates:
///
/// 1. The deletion of the session namespace, or of one of its ancestors, is
///    always delivered.
/// 2. Events from the session namespace, or from a descendant when the
///    session is recursive, continue. Events from an ancestor continue only
///    when the object propagates and the propagation is not hidden. Anything
///    else is dropped.
/// 3. The session must be allowed to `get` the event identity in its
///    namespace.
#[derive(Debug, Clone)]
pub struct PushDispatchFilter {
    authorizer: Arc<Authorizer>,
}

impl PushDispatchFilter {
    pub fn new(authorizer: Arc<Authorizer>) -> Self {
        Self { authorizer }
    }

    /// Decide whether `session` may be opened.
    pub async fn on_push_session_init(&self, session: &PushSession) -> Result<bool> {
        let restrictions = self.authorizer.restrictions(&session.credential)?;

        let options = CheckOptions::default()
            .with_source_ip(session.client_ip.as_str())
            .with_restrictions(restrictions);

        self.authorizer
            .check_authorization(
                &session.claims,
                READ_OPERATION,
                session.namespace(),
                PUSH_SESSION_IDENTITY,
                &options,
            )
            .await
            .map_err(|e| {
                error!(error = %e, namespace = session.namespace(), "Unable to authorize session");
                e
            })
    }

    pub fn on_push_session_start(&self, session: &PushSession) {
        debug!(claims = ?session.claims, namespace = session.namespace(), "Push session started");
    }

    pub fn on_push_session_stop(&self, session: &PushSession) {
        debug!(claims = ?session.claims, namespace = session.namespace(), "Push session stopped");
    }

    /// Decode the routing summary of `event`.
    pub fn summarize_event(&self, event: &ChangeEvent) -> Result<PushedEntity> {
        event.decode()
    }

    /// Additional identities to dispatch along with `identity`. There are
    /// none.
    pub fn related_event_identities(&self, _identity: &str) -> Vec<String> {
        Vec::new()
    }

    /// Decide whether `event`, summarized as `entity`, is delivered to
    /// `session`.
    pub async fn should_dispatch(
        &self,
        session: &PushSession,
        event: &ChangeEvent,
        entity: &PushedEntity,
    ) -> Result<bool> {
        let session_ns = session.namespace();

        if is_namespace_deletion_above(event, entity, session_ns) {
            return Ok(true);
        }

        if !is_topologically_visible(session, entity) {
            return Ok(false);
        }

        let restrictions = self.authorizer.restrictions(&session.credential)?;
        let options = CheckOptions::default()
            .with_restrictions(restrictions)
            .with_source_ip(session.client_ip.as_str());

        self.authorizer
            .check_authorization(
                &session.claims,
                READ_OPERATION,
                session_ns,
                &event.identity,
                &options,
            )
            .await
    }
}

fn is_namespace_deletion_above(event: &ChangeEvent, entity: &PushedEntity, session_ns: &str) -> bool {
    event.identity == NAMESPACE_IDENTITY
        && event.kind == EventType::Delete
        && (entity.name == session_ns || namespace::is_parent_of(&entity.name, session_ns))
}

fn is_topologically_visible(session: &PushSession, entity: &PushedEntity) -> bool {
    let session_ns = session.namespace();

    let is_current = entity.namespace == session_ns;
    let is_child = namespace::is_child_of(&entity.namespace, session_ns);
    if is_current || (is_child && session.is_recursive()) {
        return true;
    }

    namespace::is_parent_of(&entity.namespace, session_ns)
        && entity.propagate
        && !entity.propagation_hidden
}
