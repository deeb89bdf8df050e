//! The notification bus capability.

use super::Publication;
use crate::errors::Result;
use std::fmt;
use tokio::sync::mpsc;

/// Topic-based publish/subscribe transport.
///
/// Implementations must never block a publisher on a slow consumer: when the
/// consumer's queue is full the publication is dropped for that consumer.
pub trait NotificationBus: Send + Sync {
    /// Publish a publication on its topic.
    fn publish(&self, publication: Publication) -> Result<()>;

    /// Deliver every publication on `topic` into `sender` until the returned
    /// subscription is dropped or unsubscribed.
    fn subscribe(&self, topic: &str, sender: mpsc::Sender<Publication>) -> Subscription;
}

/// Handle of an active subscription. Dropping it unsubscribes.
pub struct Subscription {
    topic: String,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(topic: impl Into<String>, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            topic: topic.into(),
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Stop delivery.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
