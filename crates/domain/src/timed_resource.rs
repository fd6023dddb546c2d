//! Timed resources: light fuel and effects that expire.
//!
//! A resource is evaluated against a [`ClockReading`]. Fuel and world-time
//! effects are measured in seconds; round effects are measured against the
//! combat round counter and only exist inside combat.

use serde::Serialize;

use crate::documents::{HostDocument, ItemDocument};
use crate::ids::{ActorId, ItemId};
use crate::value_objects::{
    ClockReading, CombatPosition, DurationUnit, DurationUnits, EffectDuration, TotalDuration,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    /// A burning light source.
    FuelLight { remaining_secs: f64, total_secs: f64 },
    /// An effect lasting a number of combat rounds.
    RoundEffect {
        start: Option<CombatPosition>,
        duration_rounds: u32,
    },
    /// An effect lasting a span of world time.
    TimedEffect {
        start_time: f64,
        duration: EffectDuration,
    },
    /// An effect that never ends on its own (focus, permanent, unlimited).
    UnlimitedEffect { unit: DurationUnit },
}

/// What is left of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "camelCase")]
pub enum Remaining {
    Seconds(f64),
    Rounds(u32),
    Infinite,
}

impl Remaining {
    pub fn is_infinite(&self) -> bool {
        matches!(self, Remaining::Infinite)
    }
}

/// Result of evaluating a resource against a clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub expired: bool,
    pub remaining: Remaining,
    /// Share of the duration already used, 0..=100.
    pub progress: u8,
}

impl Evaluation {
    fn never_expires() -> Self {
        Self {
            expired: false,
            remaining: Remaining::Infinite,
            progress: 0,
        }
    }

    fn instant() -> Self {
        Self {
            expired: true,
            remaining: Remaining::Seconds(0.0),
            progress: 0,
        }
    }

    fn round_expired(progress: u8) -> Self {
        Self {
            expired: true,
            remaining: Remaining::Rounds(0),
            progress,
        }
    }
}

/// Outcome of burning fuel for one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BurnOutcome {
    Burning { remaining_secs: f64 },
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedResource {
    pub id: ItemId,
    pub owner_id: ActorId,
    pub name: String,
    pub kind: ResourceKind,
}

impl TimedResource {
    /// Build a fuel resource from an active light item.
    pub fn from_light_item(owner_id: ActorId, item: &ItemDocument) -> Option<Self> {
        if !item.is_active_light() {
            return None;
        }
        let light = item.light()?;
        Some(Self {
            id: item.id(),
            owner_id,
            name: item.name().to_string(),
            kind: ResourceKind::FuelLight {
                remaining_secs: light.remaining_or_full(),
                total_secs: light.total_secs(),
            },
        })
    }

    /// Build an effect resource from an Effect item with a duration.
    pub fn from_effect_item(owner_id: ActorId, item: &ItemDocument) -> Option<Self> {
        let duration = item.effect_duration()?;
        let start = item.effect_start();

        let kind = match duration.unit {
            DurationUnit::Rounds => ResourceKind::RoundEffect {
                start: start.and_then(|s| s.combat_time),
                duration_rounds: duration.whole_rounds(),
            },
            unit if unit.is_unbounded() => ResourceKind::UnlimitedEffect { unit },
            _ => ResourceKind::TimedEffect {
                start_time: start.map(|s| s.value).unwrap_or(0.0),
                duration,
            },
        };

        Some(Self {
            id: item.id(),
            owner_id,
            name: item.name().to_string(),
            kind,
        })
    }

    pub fn total_duration(&self, units: &DurationUnits) -> TotalDuration {
        match &self.kind {
            ResourceKind::FuelLight { total_secs, .. } => TotalDuration::Finite(*total_secs),
            ResourceKind::RoundEffect {
                duration_rounds, ..
            } => TotalDuration::Finite(f64::from(*duration_rounds) * units.rounds),
            ResourceKind::TimedEffect { duration, .. } => duration.total(units),
            ResourceKind::UnlimitedEffect { .. } => TotalDuration::Infinite,
        }
    }

    /// Evaluate against a clock reading.
    ///
    /// Returns `None` for a round effect evaluated at the exact round and turn
    /// it was created in; callers skip such resources for this pass.
    pub fn evaluate(&self, clock: &ClockReading, units: &DurationUnits) -> Option<Evaluation> {
        match &self.kind {
            ResourceKind::FuelLight {
                remaining_secs,
                total_secs,
            } => Some(evaluate_seconds(*remaining_secs, *total_secs)),
            ResourceKind::RoundEffect {
                start,
                duration_rounds,
            } => evaluate_rounds(*start, *duration_rounds, clock.combat),
            ResourceKind::TimedEffect {
                start_time,
                duration,
            } => Some(match duration.total(units) {
                TotalDuration::Infinite => Evaluation::never_expires(),
                TotalDuration::Finite(total) => {
                    let remaining = start_time + total - clock.world_time;
                    evaluate_seconds(remaining, total)
                }
            }),
            ResourceKind::UnlimitedEffect { .. } => Some(Evaluation::never_expires()),
        }
    }

    /// Burn `elapsed_secs` of fuel. `None` for resources that are not fuel.
    pub fn burn(&mut self, elapsed_secs: f64) -> Option<BurnOutcome> {
        let ResourceKind::FuelLight { remaining_secs, .. } = &mut self.kind else {
            return None;
        };
        *remaining_secs -= elapsed_secs;
        if *remaining_secs <= 0.0 {
            *remaining_secs = 0.0;
            Some(BurnOutcome::Exhausted)
        } else {
            Some(BurnOutcome::Burning {
                remaining_secs: *remaining_secs,
            })
        }
    }

    pub fn remaining_secs(&self) -> Option<f64> {
        match &self.kind {
            ResourceKind::FuelLight { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        }
    }
}

fn evaluate_seconds(remaining: f64, total: f64) -> Evaluation {
    if total <= 0.0 {
        return Evaluation::instant();
    }
    let elapsed = total - remaining;
    Evaluation {
        expired: remaining <= 0.0,
        remaining: Remaining::Seconds(remaining.max(0.0)),
        progress: percent(elapsed, total),
    }
}

fn evaluate_rounds(
    start: Option<CombatPosition>,
    duration_rounds: u32,
    combat: Option<CombatPosition>,
) -> Option<Evaluation> {
    // Round timers only mean something inside combat.
    let Some(current) = combat else {
        return Some(Evaluation::round_expired(100));
    };
    let Some(start) = start else {
        return Some(Evaluation::round_expired(100));
    };
    if duration_rounds == 0 {
        return Some(Evaluation::round_expired(0));
    }
    if start == current {
        return None;
    }

    let remaining =
        i64::from(start.round) + i64::from(duration_rounds) - i64::from(current.round);
    let elapsed = i64::from(duration_rounds) - remaining;
    Some(Evaluation {
        expired: remaining <= 0,
        remaining: Remaining::Rounds(remaining.clamp(0, i64::from(u32::MAX)) as u32),
        progress: percent(elapsed as f64, f64::from(duration_rounds)),
    })
}

fn percent(elapsed: f64, total: f64) -> u8 {
    let raw = (100.0 * elapsed / total).floor();
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, 100.0) as u8
}
