use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{required_id, required_name, HostDocument};
use crate::error::DomainError;
use crate::ids::ItemId;
use crate::value_objects::{CombatPosition, EffectDuration};

/// Burn time of a light source with no configured longevity, in minutes.
pub const DEFAULT_LIGHT_LONGEVITY_MINS: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Ancestry,
    Armor,
    Background,
    Basic,
    Class,
    Deity,
    Effect,
    Gem,
    Language,
    #[serde(rename = "NPC Attack")]
    NpcAttack,
    #[serde(rename = "NPC Feature")]
    NpcFeature,
    Potion,
    Scroll,
    Spell,
    Talent,
    Wand,
    Weapon,
}

/// Light-source block of an item (`system.light`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightData {
    #[serde(default)]
    pub is_source: bool,
    #[serde(default)]
    pub active: bool,
    /// Total burn time in minutes.
    #[serde(default = "default_longevity")]
    pub longevity: f64,
    /// Seconds of fuel left; absent on items that were never lit.
    #[serde(default)]
    pub remaining_secs: Option<f64>,
    /// Key into the host's light template table (torch, lantern, ...).
    #[serde(default)]
    pub template: Option<String>,
}

fn default_longevity() -> f64 {
    DEFAULT_LIGHT_LONGEVITY_MINS
}

/// Whole minutes left for `secs` of fuel, rounded up; `None` under one minute.
pub fn remaining_minutes(secs: f64) -> Option<u32> {
    if secs < 60.0 {
        None
    } else {
        Some((secs / 60.0).ceil() as u32)
    }
}

impl LightData {
    pub fn total_secs(&self) -> f64 {
        (self.longevity * 60.0).max(0.0)
    }

    /// Fuel left, defaulting to a full burn when never recorded.
    pub fn remaining_or_full(&self) -> f64 {
        self.remaining_secs.unwrap_or_else(|| self.total_secs())
    }

    /// Whole minutes left, rounded up; `None` under one minute.
    pub fn remaining_minutes(&self) -> Option<u32> {
        remaining_minutes(self.remaining_or_full())
    }
}

/// When an effect began (`system.start`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectStart {
    /// World time at creation.
    #[serde(default)]
    pub value: f64,
    /// Combat position at creation, `None` when created outside combat.
    #[serde(default)]
    pub combat_time: Option<CombatPosition>,
}

/// A validated item document.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDocument {
    id: ItemId,
    name: String,
    item_type: ItemType,
    source: Value,
}

impl ItemDocument {
    pub fn from_source(source: Value) -> Result<Self, DomainError> {
        let id = required_id(&source, Self::KIND)?;
        let name = required_name(&source, Self::KIND)?;
        let item_type = source
            .get("type")
            .cloned()
            .ok_or_else(|| DomainError::validation("Item document has no type"))
            .and_then(|t| {
                serde_json::from_value(t)
                    .map_err(|e| DomainError::validation(format!("Unknown item type: {}", e)))
            })?;

        Ok(Self {
            id,
            name,
            item_type,
            source,
        })
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn into_source(self) -> Value {
        self.source
    }

    /// The `system.light` block, if present and well-formed.
    pub fn light(&self) -> Option<LightData> {
        self.system_field("light")
    }

    /// Basic and Effect items flagged as a light source.
    pub fn is_light(&self) -> bool {
        matches!(self.item_type, ItemType::Basic | ItemType::Effect)
            && self.light().is_some_and(|l| l.is_source)
    }

    pub fn is_active_light(&self) -> bool {
        self.is_light() && self.light().is_some_and(|l| l.active)
    }

    pub fn is_effect(&self) -> bool {
        self.item_type == ItemType::Effect
    }

    pub fn effect_duration(&self) -> Option<EffectDuration> {
        if !self.is_effect() {
            return None;
        }
        self.system_field("duration")
    }

    pub fn effect_start(&self) -> Option<EffectStart> {
        if !self.is_effect() {
            return None;
        }
        self.system_field("start")
    }

    fn system_field<T: serde::de::DeserializeOwned>(&self, field: &str) -> Option<T> {
        let value = self.source.get("system")?.get(field)?;
        serde_json::from_value(value.clone()).ok()
    }
}

impl HostDocument for ItemDocument {
    type Id = ItemId;
    const KIND: &'static str = "Item";

    fn id(&self) -> ItemId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> &Value {
        &self.source
    }
}
