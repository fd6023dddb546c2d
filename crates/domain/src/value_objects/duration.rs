//! Effect durations and the unit table that converts them to world seconds.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Unit an effect's duration is expressed in.
///
/// `Focus`, `Permanent` and `Unlimited` never expire; `Instant` is over as
/// soon as it starts. `Rounds` is measured against the combat round counter
/// rather than world time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DurationUnit {
    Instant,
    Rounds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Focus,
    Permanent,
    Unlimited,
}

impl DurationUnit {
    /// True for units with no end (`focus`, `permanent`, `unlimited`).
    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            DurationUnit::Focus | DurationUnit::Permanent | DurationUnit::Unlimited
        )
    }

    pub fn is_rounds(&self) -> bool {
        matches!(self, DurationUnit::Rounds)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationUnit::Instant => "instant",
            DurationUnit::Rounds => "rounds",
            DurationUnit::Seconds => "seconds",
            DurationUnit::Minutes => "minutes",
            DurationUnit::Hours => "hours",
            DurationUnit::Days => "days",
            DurationUnit::Focus => "focus",
            DurationUnit::Permanent => "permanent",
            DurationUnit::Unlimited => "unlimited",
        }
    }
}

impl std::fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DurationUnit {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "instant" => Ok(DurationUnit::Instant),
            "rounds" => Ok(DurationUnit::Rounds),
            "seconds" => Ok(DurationUnit::Seconds),
            "minutes" => Ok(DurationUnit::Minutes),
            "hours" => Ok(DurationUnit::Hours),
            "days" => Ok(DurationUnit::Days),
            "focus" => Ok(DurationUnit::Focus),
            "permanent" => Ok(DurationUnit::Permanent),
            "unlimited" => Ok(DurationUnit::Unlimited),
            other => Err(DomainError::parse(format!("Unknown duration unit: {}", other))),
        }
    }
}

/// Seconds of world time per duration unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationUnits {
    pub seconds: f64,
    pub minutes: f64,
    /// A round counts as 360 seconds when converted to world time.
    pub rounds: f64,
    pub hours: f64,
    pub days: f64,
}

impl Default for DurationUnits {
    fn default() -> Self {
        Self {
            seconds: 1.0,
            minutes: 60.0,
            rounds: 360.0,
            hours: 3600.0,
            days: 86400.0,
        }
    }
}

impl DurationUnits {
    /// Seconds per unit, `None` for units without a finite scale.
    pub fn seconds_per(&self, unit: DurationUnit) -> Option<f64> {
        match unit {
            DurationUnit::Seconds => Some(self.seconds),
            DurationUnit::Minutes => Some(self.minutes),
            DurationUnit::Rounds => Some(self.rounds),
            DurationUnit::Hours => Some(self.hours),
            DurationUnit::Days => Some(self.days),
            DurationUnit::Instant
            | DurationUnit::Focus
            | DurationUnit::Permanent
            | DurationUnit::Unlimited => None,
        }
    }
}

/// Total length of a resource in world seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TotalDuration {
    Finite(f64),
    Infinite,
}

impl TotalDuration {
    pub fn is_infinite(&self) -> bool {
        matches!(self, TotalDuration::Infinite)
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, TotalDuration::Finite(secs) if *secs <= 0.0)
    }
}

/// Duration configured on an effect: a unit plus an amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectDuration {
    #[serde(rename = "type")]
    pub unit: DurationUnit,
    #[serde(default)]
    pub value: f64,
}

impl EffectDuration {
    pub fn new(unit: DurationUnit, value: f64) -> Self {
        Self { unit, value }
    }

    pub fn rounds(value: u32) -> Self {
        Self::new(DurationUnit::Rounds, f64::from(value))
    }

    pub fn minutes(value: u32) -> Self {
        Self::new(DurationUnit::Minutes, f64::from(value))
    }

    /// Length in world seconds under the given unit table.
    pub fn total(&self, units: &DurationUnits) -> TotalDuration {
        if self.unit.is_unbounded() {
            return TotalDuration::Infinite;
        }
        let per = units.seconds_per(self.unit).unwrap_or(0.0);
        TotalDuration::Finite((self.value * per).max(0.0))
    }

    /// Whole rounds for round-based durations; fractional values truncate.
    pub fn whole_rounds(&self) -> u32 {
        if self.value.is_finite() && self.value > 0.0 {
            self.value.trunc() as u32
        } else {
            0
        }
    }
}
