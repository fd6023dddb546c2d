//! Readings from the two clocks timed resources are measured against.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Position within an active combat encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CombatPosition {
    pub round: u32,
    pub turn: u32,
}

impl CombatPosition {
    pub fn new(round: u32, turn: u32) -> Self {
        Self { round, turn }
    }

    /// Parse the legacy `"round.turn"` encoding (e.g. `"3.1"`).
    pub fn parse_legacy(value: &str) -> Result<Self, DomainError> {
        let mut parts = value.trim().splitn(2, '.');
        let round = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| DomainError::parse(format!("Empty combat time: '{}'", value)))?;
        let turn = parts.next().unwrap_or("0");

        let round = round
            .parse::<u32>()
            .map_err(|e| DomainError::parse(format!("Invalid combat round '{}': {}", value, e)))?;
        let turn = turn
            .parse::<u32>()
            .map_err(|e| DomainError::parse(format!("Invalid combat turn '{}': {}", value, e)))?;

        Ok(Self { round, turn })
    }
}

impl std::fmt::Display for CombatPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.round, self.turn)
    }
}

// Accept both the structured form and the legacy string form.
#[derive(Deserialize)]
#[serde(untagged)]
enum CombatPositionRepr {
    Structured { round: u32, turn: u32 },
    Legacy(String),
}

impl<'de> Deserialize<'de> for CombatPosition {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match CombatPositionRepr::deserialize(deserializer)? {
            CombatPositionRepr::Structured { round, turn } => Ok(Self { round, turn }),
            CombatPositionRepr::Legacy(raw) => {
                Self::parse_legacy(&raw).map_err(serde::de::Error::custom)
            }
        }
    }
}

/// A single reading of world time, combat position and the global pause flag.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockReading {
    /// Seconds since the world epoch. May move backwards after a GM rewind.
    pub world_time: f64,
    /// Current combat position, `None` outside combat.
    pub combat: Option<CombatPosition>,
    pub paused: bool,
}

impl ClockReading {
    pub fn at(world_time: f64) -> Self {
        Self {
            world_time,
            combat: None,
            paused: false,
        }
    }

    pub fn in_combat(mut self, round: u32, turn: u32) -> Self {
        self.combat = Some(CombatPosition::new(round, turn));
        self
    }
}
