//! Value objects - Immutable objects defined by their attributes

mod authority;
mod clock;
mod duration;
mod partial_update;
mod schema_version;

pub use authority::AuthorityRole;
pub use clock::{ClockReading, CombatPosition};
pub use duration::{DurationUnit, DurationUnits, EffectDuration, TotalDuration};
pub use partial_update::PartialUpdate;
pub use schema_version::SchemaVersion;
