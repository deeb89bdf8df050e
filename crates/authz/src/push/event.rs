//! Change events and their push summary

use nsgate_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Kind of change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Create,
    Update,
    Delete,
}

/// A change of an object, as published to push sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Identity of the changed object, such as `namespace`
    pub identity: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    /// The changed object
    #[serde(default)]
    pub entity: serde_json::Value,
}

impl ChangeEvent {
    pub fn new(identity: impl Into<String>, kind: EventType, entity: serde_json::Value) -> Self {
        Self {
            identity: identity.into(),
            kind,
            entity,
        }
    }

    /// Decode the changed object.
    pub fn decode<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.entity.clone())
            .map_err(|e| Error::decode(format!("{} event entity", self.identity), e))
    }
}

/// The fields of a changed object used to route it to push sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushedEntity {
    #[serde(rename = "ID")]
    pub id: String,
    pub namespace: String,
    pub name: String,
    pub propagate: bool,
    #[serde(rename = "propagationHidden")]
    pub propagation_hidden: bool,
}
