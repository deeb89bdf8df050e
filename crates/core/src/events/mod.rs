//! Notification plumbing used to propagate policy changes.
//!
//! Publishers send small typed [`NotificationMessage`]s, encoded as JSON
//! [`Publication`]s, on a topic of a [`NotificationBus`]. Consumers receive
//! them through a bounded queue; delivery is best-effort and a saturated
//! queue drops new publications instead of blocking the publisher.

mod bus;
mod local;
mod subscribe;

pub use bus::{NotificationBus, Subscription};
pub use local::LocalNotificationBus;
pub use subscribe::spawn_subscription;

use crate::errors::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Content of a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl NotificationMessage {
    pub fn new(kind: impl Into<String>, data: impl Into<serde_json::Value>) -> Self {
        Self {
            kind: kind.into(),
            data: data.into(),
        }
    }

    /// The payload as a string, if it is one.
    pub fn data_str(&self) -> Option<&str> {
        self.data.as_str()
    }
}

/// An encoded message travelling on a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl Publication {
    /// Build a publication with a raw payload.
    pub fn raw(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }

    /// Encode `message` as the JSON payload of a publication on `topic`.
    pub fn encode<T: Serialize>(topic: impl Into<String>, message: &T) -> Result<Self> {
        let topic = topic.into();
        let payload = serde_json::to_vec(message)
            .map_err(|e| Error::encode(format!("publication on '{topic}'"), e))?;
        Ok(Self { topic, payload })
    }

    /// Decode the JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| Error::decode(format!("publication on '{}'", self.topic), e))
    }
}

/// Encode `message` and publish it on `topic`.
pub fn publish(bus: &dyn NotificationBus, topic: &str, message: &NotificationMessage) -> Result<()> {
    bus.publish(Publication::encode(topic, message)?)
}
