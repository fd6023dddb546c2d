//! Relay messages from delegates to the authoritative process.
//!
//! Delivery is one-way and best-effort: no acknowledgement, at most once.
//!
//! ## Versioning Policy
//!
//! - New variants can be added at the end (forward compatible)
//! - Unknown message types deserialize to `Unknown` and are ignored

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Channel every relay message is published on.
pub const RELAY_CHANNEL: &str = "system.shadowdark";

/// Scene coordinates a light was dropped at.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DropPosition {
    pub x: f64,
    pub y: f64,
}

// =============================================================================
// Relay Messages (Delegate → Authoritative)
// =============================================================================

/// Wire shape is `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum RelayMessage {
    /// Turn a carried light on or off.
    #[serde(rename_all = "camelCase")]
    ToggleLightSource { actor_id: Uuid, item_id: Uuid },

    /// Pick a dropped light back up into a character's inventory.
    #[serde(rename_all = "camelCase")]
    PickupLightSourceFromScene {
        character_id: Uuid,
        light_actor_id: Uuid,
    },

    /// Drop a carried light onto the scene as a standalone light actor.
    #[serde(rename_all = "camelCase")]
    DropLightSourceOnScene {
        item_id: Uuid,
        item_owner_id: Uuid,
        #[serde(default)]
        position: DropPosition,
    },

    /// Any message type this build does not know, whatever its `data`.
    Unknown,
}

impl<'de> Deserialize<'de> for RelayMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireMessage::deserialize(deserializer)?;
        if !KNOWN_TYPES.contains(&wire.kind.as_str()) {
            return Ok(RelayMessage::Unknown);
        }
        let tagged = serde_json::json!({"type": wire.kind, "data": wire.data});
        KnownMessage::deserialize(tagged)
            .map(RelayMessage::from)
            .map_err(serde::de::Error::custom)
    }
}

const KNOWN_TYPES: [&str; 3] = [
    "toggleLightSource",
    "pickupLightSourceFromScene",
    "dropLightSourceOnScene",
];

/// Type name and untouched payload, read before the type is looked at.
#[derive(Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

/// The known variants, parsed strictly.
#[derive(Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
enum KnownMessage {
    #[serde(rename_all = "camelCase")]
    ToggleLightSource { actor_id: Uuid, item_id: Uuid },
    #[serde(rename_all = "camelCase")]
    PickupLightSourceFromScene {
        character_id: Uuid,
        light_actor_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    DropLightSourceOnScene {
        item_id: Uuid,
        item_owner_id: Uuid,
        #[serde(default)]
        position: DropPosition,
    },
}

impl From<KnownMessage> for RelayMessage {
    fn from(message: KnownMessage) -> Self {
        match message {
            KnownMessage::ToggleLightSource { actor_id, item_id } => {
                RelayMessage::ToggleLightSource { actor_id, item_id }
            }
            KnownMessage::PickupLightSourceFromScene {
                character_id,
                light_actor_id,
            } => RelayMessage::PickupLightSourceFromScene {
                character_id,
                light_actor_id,
            },
            KnownMessage::DropLightSourceOnScene {
                item_id,
                item_owner_id,
                position,
            } => RelayMessage::DropLightSourceOnScene {
                item_id,
                item_owner_id,
                position,
            },
        }
    }
}

impl RelayMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            RelayMessage::ToggleLightSource { .. } => "toggleLightSource",
            RelayMessage::PickupLightSourceFromScene { .. } => "pickupLightSourceFromScene",
            RelayMessage::DropLightSourceOnScene { .. } => "dropLightSourceOnScene",
            RelayMessage::Unknown => "unknown",
        }
    }
}

/// A relay message as published, with its channel and sending user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub channel: String,
    #[serde(default)]
    pub sender: Option<Uuid>,
    pub message: RelayMessage,
}

impl RelayEnvelope {
    pub fn new(sender: Option<Uuid>, message: RelayMessage) -> Self {
        Self {
            channel: RELAY_CHANNEL.to_string(),
            sender,
            message,
        }
    }

    pub fn is_system_channel(&self) -> bool {
        self.channel == RELAY_CHANNEL
    }
}
