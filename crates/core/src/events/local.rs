//! In-process notification bus.

use super::bus::{NotificationBus, Subscription};
use super::Publication;
use crate::errors::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Notification bus delivering publications to subscribers of the same
/// process.
///
/// Each subscriber owns a bounded queue. When a queue is full the
/// publication is dropped for that subscriber and counted; the publisher is
/// never blocked.
#[derive(Clone, Default)]
pub struct LocalNotificationBus {
    inner: Arc<BusInner>,
}

#[derive(Default)]
struct BusInner {
    topics: RwLock<HashMap<String, Vec<Subscriber>>>,
    next_id: AtomicU64,
    dropped: AtomicU64,
}

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<Publication>,
}

impl LocalNotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publications dropped because a subscriber queue was full.
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    /// Number of live subscriptions on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner
            .topics
            .read()
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl BusInner {
    fn remove(&self, topic: &str, id: u64) {
        let mut topics = self.topics.write();
        if let Some(subscribers) = topics.get_mut(topic) {
            subscribers.retain(|s| s.id != id);
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }
    }
}

impl NotificationBus for LocalNotificationBus {
    fn publish(&self, publication: Publication) -> Result<()> {
        let mut closed = Vec::new();

        {
            let topics = self.inner.topics.read();
            let Some(subscribers) = topics.get(&publication.topic) else {
                debug!(topic = %publication.topic, "No subscriber for publication");
                return Ok(());
            };

            for subscriber in subscribers {
                match subscriber.sender.try_send(publication.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            topic = %publication.topic,
                            subscriber = subscriber.id,
                            "Subscriber queue is full, dropping publication"
                        );
                    }
                    Err(TrySendError::Closed(_)) => closed.push(subscriber.id),
                }
            }
        }

        for id in closed {
            self.inner.remove(&publication.topic, id);
        }

        Ok(())
    }

    fn subscribe(&self, topic: &str, sender: mpsc::Sender<Publication>) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        self.inner
            .topics
            .write()
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber { id, sender });

        debug!(topic, subscriber = id, "Subscribed to topic");

        let inner: Weak<BusInner> = Arc::downgrade(&self.inner);
        let owned_topic = topic.to_string();
        Subscription::new(topic, move || {
            if let Some(inner) = inner.upgrade() {
                inner.remove(&owned_topic, id);
                debug!(topic = %owned_topic, subscriber = id, "Unsubscribed from topic");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_subscribers_of_topic() {
        let bus = LocalNotificationBus::new();
        let (tx, mut rx) = mpsc::channel(4);
        let (other_tx, mut other_rx) = mpsc::channel(4);

        let _sub = bus.subscribe("a", tx);
        let _other = bus.subscribe("b", other_tx);

        bus.publish(Publication::raw("a", b"hello".to_vec())).unwrap();

        assert_eq!(rx.recv().await.unwrap().payload, b"hello");
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let bus = LocalNotificationBus::new();
        let (tx, mut rx) = mpsc::channel(1);
        let _sub = bus.subscribe("a", tx);

        bus.publish(Publication::raw("a", b"1".to_vec())).unwrap();
        bus.publish(Publication::raw("a", b"2".to_vec())).unwrap();
        bus.publish(Publication::raw("a", b"3".to_vec())).unwrap();

        assert_eq!(bus.dropped(), 2);
        assert_eq!(rx.recv().await.unwrap().payload, b"1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_removes_subscriber() {
        let bus = LocalNotificationBus::new();
        let (tx, _rx) = mpsc::channel(1);

        let sub = bus.subscribe("a", tx);
        assert_eq!(bus.subscriber_count("a"), 1);

        sub.unsubscribe();
        assert_eq!(bus.subscriber_count("a"), 0);
    }

    #[test]
    fn test_closed_receivers_are_pruned() {
        let bus = LocalNotificationBus::new();
        let (tx, rx) = mpsc::channel(1);
        let sub = bus.subscribe("a", tx);
        drop(rx);

        bus.publish(Publication::raw("a", b"x".to_vec())).unwrap();
        assert_eq!(bus.subscriber_count("a"), 0);
        drop(sub);
    }
}
