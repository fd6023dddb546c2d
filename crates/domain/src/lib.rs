//! Shadowdark domain: timed resources, host documents and the value objects
//! the engine works with. Pure data and rules, no I/O.

pub mod documents;
pub mod error;
pub mod ids;
pub mod owner_snapshot;
pub mod timed_resource;
pub mod value_objects;

pub use documents::{
    remaining_minutes, ActorDocument, ActorType, DocumentEntry, EffectStart, HostDocument,
    ItemDocument, ItemType, LightData, RawDocument, DEFAULT_LIGHT_LONGEVITY_MINS,
};
pub use error::DomainError;
pub use ids::{ActorId, ItemId, PackId, UserId};
pub use owner_snapshot::{OwnerSnapshot, TrackerSnapshot};
pub use timed_resource::{BurnOutcome, Evaluation, Remaining, ResourceKind, TimedResource};
pub use value_objects::{
    AuthorityRole, ClockReading, CombatPosition, DurationUnit, DurationUnits, EffectDuration,
    PartialUpdate, SchemaVersion, TotalDuration,
};
