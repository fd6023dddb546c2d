//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of the rules system.
//! Use cases depend only on port traits from `infrastructure::ports`.

pub mod effects;
pub mod light_tracker;
pub mod migration;
pub mod relay_dispatch;
pub mod scene_light;
pub mod settings;

// Re-export main types
pub use effects::{EffectError, EffectOps, EffectUseCases, ExpireEffects, ExpiryReport};
pub use light_tracker::{
    LightSourceTracker, SkipReason, TickOutcome, TickReport, ToggleOutcome, TrackerError,
    TrackerStatus,
};
pub use migration::{MigrationError, MigrationReport, MigrationRunner, MigrationStep};
pub use relay_dispatch::{DispatchError, DispatchOutcome, RelayDispatcher};
pub use scene_light::{LightSceneOps, SceneLightError, SceneLightOutcome};
pub use settings::{SettingsError, SettingsOps, TrackerConfig};
