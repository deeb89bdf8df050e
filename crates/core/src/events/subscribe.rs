//! Background consumption of a topic.

use super::bus::NotificationBus;
use super::{NotificationMessage, Publication};
use crate::lifecycle::ShutdownSignal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Subscribe to `topic` and run `handler` for every decoded message until
/// `shutdown` fires or the bus stops delivering.
///
/// The subscription queue holds at most `capacity` undelivered publications.
/// Publications that fail to decode are logged and dropped.
pub fn spawn_subscription<F>(
    bus: &dyn NotificationBus,
    topic: &str,
    capacity: usize,
    mut shutdown: ShutdownSignal,
    handler: F,
) -> JoinHandle<()>
where
    F: Fn(NotificationMessage) + Send + Sync + 'static,
{
    let (sender, mut receiver) = mpsc::channel::<Publication>(capacity.max(1));
    let subscription = bus.subscribe(topic, sender);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = receiver.recv() => {
                    let Some(publication) = received else {
                        break;
                    };

                    match publication.decode::<NotificationMessage>() {
                        Ok(message) => handler(message),
                        Err(e) => {
                            error!(topic = %publication.topic, error = %e, "Unable to decode notification");
                        }
                    }
                }
            }
        }

        debug!(topic = %subscription.topic(), "Stopping subscription");
        subscription.unsubscribe();
    })
}
