//! Clock implementations: wall clock and the shared game clock.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use shadowdark_domain::{ClockReading, CombatPosition};

use crate::infrastructure::ports::{ClockPort, GameClockPort};

/// System clock - uses real time.
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl ClockPort for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Game clock state shared between whoever drives time and its readers.
///
/// The host advances world time and combat; this adapter only stores the
/// latest values. A poisoned lock still yields the last written reading.
#[derive(Default)]
pub struct SharedGameClock {
    state: RwLock<ClockReading>,
}

impl SharedGameClock {
    pub fn new(reading: ClockReading) -> Self {
        Self {
            state: RwLock::new(reading),
        }
    }

    fn write(&self, f: impl FnOnce(&mut ClockReading)) {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }

    /// Move world time forward (or backward, for a rewind).
    pub fn advance(&self, seconds: f64) {
        self.write(|r| r.world_time += seconds);
    }

    pub fn set_world_time(&self, seconds: f64) {
        self.write(|r| r.world_time = seconds);
    }

    pub fn set_paused(&self, paused: bool) {
        self.write(|r| r.paused = paused);
    }

    pub fn begin_combat(&self) {
        self.write(|r| r.combat = Some(CombatPosition::new(1, 0)));
    }

    pub fn set_combat(&self, position: Option<CombatPosition>) {
        self.write(|r| r.combat = position);
    }

    pub fn end_combat(&self) {
        self.write(|r| r.combat = None);
    }
}

impl GameClockPort for SharedGameClock {
    fn reading(&self) -> ClockReading {
        match self.state.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
