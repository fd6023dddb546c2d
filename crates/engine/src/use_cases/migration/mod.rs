//! Versioned data migrations.
//!
//! Each [`MigrationStep`] carries a schema version and rewrites settings,
//! actors and items into that version's shape. The [`MigrationRunner`]
//! applies every step newer than the stored schema version, oldest first,
//! and records a step's version only after its whole sweep has finished.
//!
//! Steps see raw document sources so documents that fail validation are
//! migrated too. A step must return an empty update for data it has already
//! migrated: an interrupted run retries the same step from the start.

mod runner;
mod steps;

use async_trait::async_trait;
use serde_json::Value;
use shadowdark_domain::{DomainError, PartialUpdate, SchemaVersion};

use crate::infrastructure::ports::RepoError;
use crate::use_cases::settings::{SettingsError, SettingsOps};

pub use runner::{MigrationReport, MigrationRunner, BOOTSTRAP_CUTOFF};
pub use steps::{builtin_steps, LegacyCombatTime, LightFuel, TrackerIntervalSeconds};

#[async_trait]
pub trait MigrationStep: Send + Sync {
    fn version(&self) -> SchemaVersion;

    async fn update_settings(&self, _settings: &SettingsOps) -> Result<(), MigrationError> {
        Ok(())
    }

    fn update_actor(&self, _actor: &Value) -> Result<PartialUpdate, DomainError> {
        Ok(PartialUpdate::new())
    }

    /// `owner` is the parent actor's source, with this step's actor update
    /// already applied, when the item is embedded.
    fn update_item(
        &self,
        _item: &Value,
        _owner: Option<&Value>,
    ) -> Result<PartialUpdate, DomainError> {
        Ok(PartialUpdate::new())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl MigrationError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Domain(DomainError::PermissionDenied(_)))
    }
}
