use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{required_id, required_name, HostDocument};
use crate::error::DomainError;
use crate::ids::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorType {
    Player,
    #[serde(rename = "NPC")]
    Npc,
    /// A light source dropped on the scene, carrying the original item.
    Light,
}

/// A validated actor document. Embedded items are listed separately.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorDocument {
    id: ActorId,
    name: String,
    actor_type: ActorType,
    source: Value,
}

impl ActorDocument {
    pub fn from_source(source: Value) -> Result<Self, DomainError> {
        let id = required_id(&source, Self::KIND)?;
        let name = required_name(&source, Self::KIND)?;
        let actor_type = source
            .get("type")
            .cloned()
            .ok_or_else(|| DomainError::validation("Actor document has no type"))
            .and_then(|t| {
                serde_json::from_value(t)
                    .map_err(|e| DomainError::validation(format!("Unknown actor type: {}", e)))
            })?;

        Ok(Self {
            id,
            name,
            actor_type,
            source,
        })
    }

    pub fn actor_type(&self) -> ActorType {
        self.actor_type
    }

    pub fn is_light(&self) -> bool {
        self.actor_type == ActorType::Light
    }

    /// Source of the item a dropped light actor carries.
    pub fn carried_light(&self) -> Option<&Value> {
        if !self.is_light() {
            return None;
        }
        self.source
            .pointer("/system/lightSource")
            .filter(|v| v.is_object())
    }

    pub fn into_source(self) -> Value {
        self.source
    }
}

impl HostDocument for ActorDocument {
    type Id = ActorId;
    const KIND: &'static str = "Actor";

    fn id(&self) -> ActorId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> &Value {
        &self.source
    }
}
