//! Translate object change events into cache invalidation notifications.
//!
//! Services that only see change events (for instance through a push
//! connection) use this to keep their decision cache consistent: a change of
//! a namespace invalidates the namespace itself, and a change of an
//! authorization policy invalidates the namespace the policy lives in.

use crate::push::ChangeEvent;
use nsgate_core::events::publish;
use nsgate_core::{
    NotificationBus, NotificationMessage, Result, ShutdownSignal, AUTHORIZATION_IDENTITY,
    NAMESPACE_CHANGES_TOPIC, NAMESPACE_IDENTITY,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventData {
    namespace: String,
    name: String,
}

/// Namespace whose cached decisions are affected by `event`, if any.
pub fn invalidation_target(event: &ChangeEvent) -> Result<Option<String>> {
    let target = match event.identity.as_str() {
        NAMESPACE_IDENTITY => event.decode::<EventData>()?.name,
        AUTHORIZATION_IDENTITY => event.decode::<EventData>()?.namespace,
        _ => return Ok(None),
    };

    Ok(Some(target).filter(|ns| !ns.is_empty()))
}

/// Publishes an invalidation notification for every relevant change event.
pub struct ChangeEventBridge {
    bus: Arc<dyn NotificationBus>,
    topic: String,
}

impl ChangeEventBridge {
    /// Bridge publishing on the default namespace change topic.
    pub fn new(bus: Arc<dyn NotificationBus>) -> Self {
        Self::with_topic(bus, NAMESPACE_CHANGES_TOPIC)
    }

    pub fn with_topic(bus: Arc<dyn NotificationBus>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Publish the invalidation caused by `event`. Returns whether one was
    /// published.
    pub fn forward(&self, event: &ChangeEvent) -> Result<bool> {
        let Some(target) = invalidation_target(event)? else {
            return Ok(false);
        };

        debug!(identity = %event.identity, namespace = %target, "Forwarding invalidation");
        let message = NotificationMessage::new(NAMESPACE_CHANGES_TOPIC, target);
        publish(self.bus.as_ref(), &self.topic, &message)?;
        Ok(true)
    }

    /// Forward every event received on `events` until `shutdown` fires or
    /// the channel closes. Failures are logged and skipped.
    pub fn spawn(
        self,
        mut events: mpsc::Receiver<ChangeEvent>,
        mut shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    received = events.recv() => {
                        let Some(event) = received else {
                            break;
                        };

                        if let Err(e) = self.forward(&event) {
                            error!(error = %e, identity = %event.identity, "Unable to forward change event");
                        }
                    }
                }
            }

            debug!(topic = %self.topic, "Change event bridge stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::EventType;
    use nsgate_core::{LocalNotificationBus, Publication};
    use serde_json::json;

    #[test]
    fn test_invalidation_targets() {
        let ns_event = ChangeEvent::new(
            NAMESPACE_IDENTITY,
            EventType::Delete,
            json!({"name": "/a/b", "namespace": "/a"}),
        );
        assert_eq!(invalidation_target(&ns_event).unwrap().as_deref(), Some("/a/b"));

        let policy_event = ChangeEvent::new(
            AUTHORIZATION_IDENTITY,
            EventType::Update,
            json!({"name": "policy", "namespace": "/a"}),
        );
        assert_eq!(invalidation_target(&policy_event).unwrap().as_deref(), Some("/a"));

        let other = ChangeEvent::new("things", EventType::Update, json!({"namespace": "/a"}));
        assert_eq!(invalidation_target(&other).unwrap(), None);

        let broken = ChangeEvent::new(NAMESPACE_IDENTITY, EventType::Update, json!([1]));
        assert!(invalidation_target(&broken).is_err());
    }

    #[tokio::test]
    async fn test_forward_publishes_on_topic() {
        let bus = Arc::new(LocalNotificationBus::new());
        let (tx, mut rx) = mpsc::channel(4);
        let _sub = bus.subscribe(NAMESPACE_CHANGES_TOPIC, tx);

        let bridge = ChangeEventBridge::new(bus.clone());
        let published = bridge
            .forward(&ChangeEvent::new(
                AUTHORIZATION_IDENTITY,
                EventType::Create,
                json!({"namespace": "/a"}),
            ))
            .unwrap();
        assert!(published);

        let publication: Publication = rx.recv().await.unwrap();
        let message: NotificationMessage = publication.decode().unwrap();
        assert_eq!(message.kind, NAMESPACE_CHANGES_TOPIC);
        assert_eq!(message.data_str(), Some("/a"));

        assert!(!bridge
            .forward(&ChangeEvent::new("things", EventType::Create, json!({})))
            .unwrap());
    }
}
