//! Typed access to the system's named settings.
//!
//! Missing keys read as their defaults. Values of the wrong shape also read as
//! defaults, with a warning, so a hand-edited settings store never stops the
//! tracker or the migration runner from starting.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use shadowdark_domain::{DomainError, SchemaVersion};

use crate::infrastructure::ports::{RepoError, SettingsRepo};

/// Setting keys as the host stores them.
pub mod keys {
    pub const TRACK_LIGHT_SOURCES: &str = "trackLightSources";
    pub const TRACK_LIGHT_SOURCES_INTERVAL: &str = "trackLightSourcesInterval";
    /// Present once the interval is known to be stored in seconds.
    pub const TRACK_LIGHT_SOURCES_INTERVAL_UNIT: &str = "trackLightSourcesIntervalUnit";
    pub const PAUSE_LIGHT_TRACKING_WITH_GAME: &str = "pauseLightTrackingWithGame";
    pub const TRACK_INACTIVE_USER_LIGHT_SOURCES: &str = "trackInactiveUserLightSources";
    pub const SCHEMA_VERSION: &str = "schemaVersion";
}

pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 60.0;

/// Value of [`keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT`] for intervals in seconds.
pub const INTERVAL_UNIT_SECONDS: &str = "seconds";

/// Light tracker configuration, read from settings at start and on reload.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub enabled: bool,
    /// Seconds of fuel burned per tick; also the tick period.
    pub tick_interval_secs: f64,
    pub pause_with_game: bool,
    /// Track lights of users who are not logged in.
    pub monitor_inactive: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            pause_with_game: true,
            monitor_inactive: false,
        }
    }
}

impl TrackerConfig {
    pub fn tick_interval(&self) -> Duration {
        if self.tick_interval_secs.is_finite() && self.tick_interval_secs > 0.0 {
            Duration::from_secs_f64(self.tick_interval_secs)
        } else {
            Duration::from_secs_f64(DEFAULT_TICK_INTERVAL_SECS)
        }
    }
}

pub struct SettingsOps {
    repo: Arc<dyn SettingsRepo>,
}

impl SettingsOps {
    pub fn new(repo: Arc<dyn SettingsRepo>) -> Self {
        Self { repo }
    }

    /// The underlying store, for migration steps that rewrite raw settings.
    pub fn repo(&self) -> &dyn SettingsRepo {
        self.repo.as_ref()
    }

    pub async fn tracker_config(&self) -> Result<TrackerConfig, SettingsError> {
        let defaults = TrackerConfig::default();

        let interval = self
            .read_f64(
                keys::TRACK_LIGHT_SOURCES_INTERVAL,
                defaults.tick_interval_secs,
            )
            .await?;
        let tick_interval_secs = if interval.is_finite() && interval > 0.0 {
            interval
        } else {
            tracing::warn!(
                interval,
                "Invalid light tracking interval, using {} seconds",
                DEFAULT_TICK_INTERVAL_SECS
            );
            DEFAULT_TICK_INTERVAL_SECS
        };

        Ok(TrackerConfig {
            enabled: self
                .read_bool(keys::TRACK_LIGHT_SOURCES, defaults.enabled)
                .await?,
            tick_interval_secs,
            pause_with_game: self
                .read_bool(keys::PAUSE_LIGHT_TRACKING_WITH_GAME, defaults.pause_with_game)
                .await?,
            monitor_inactive: self
                .read_bool(
                    keys::TRACK_INACTIVE_USER_LIGHT_SOURCES,
                    defaults.monitor_inactive,
                )
                .await?,
        })
    }

    pub async fn schema_version(&self) -> Result<SchemaVersion, SettingsError> {
        let raw = self
            .read_f64(keys::SCHEMA_VERSION, SchemaVersion::UNSET.value())
            .await?;
        match SchemaVersion::new(raw) {
            Ok(version) => Ok(version),
            Err(e) => {
                tracing::warn!(error = %e, "Stored schema version is invalid, treating as unset");
                Ok(SchemaVersion::UNSET)
            }
        }
    }

    pub async fn set_schema_version(&self, version: SchemaVersion) -> Result<(), SettingsError> {
        self.repo
            .set(keys::SCHEMA_VERSION, json!(version.value()))
            .await?;
        tracing::info!(version = %version, "Schema version updated");
        Ok(())
    }

    pub async fn set_bool(&self, key: &str, value: bool) -> Result<(), SettingsError> {
        self.repo.set(key, Value::Bool(value)).await?;
        Ok(())
    }

    pub async fn set_tick_interval(&self, seconds: f64) -> Result<(), SettingsError> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(SettingsError::Invalid(DomainError::validation(format!(
                "tick interval must be a positive number of seconds, got {}",
                seconds
            ))));
        }
        self.repo
            .set(keys::TRACK_LIGHT_SOURCES_INTERVAL, json!(seconds))
            .await?;
        self.repo
            .set(
                keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT,
                json!(INTERVAL_UNIT_SECONDS),
            )
            .await?;
        Ok(())
    }

    async fn read_bool(&self, key: &str, default: bool) -> Result<bool, SettingsError> {
        match self.repo.get(key).await? {
            None => Ok(default),
            Some(Value::Bool(value)) => Ok(value),
            Some(other) => {
                tracing::warn!(key, value = %other, "Setting is not a boolean, using default");
                Ok(default)
            }
        }
    }

    async fn read_f64(&self, key: &str, default: f64) -> Result<f64, SettingsError> {
        match self.repo.get(key).await? {
            None => Ok(default),
            Some(value) => match number_of(&value) {
                Some(n) => Ok(n),
                None => {
                    tracing::warn!(key, value = %value, "Setting is not a number, using default");
                    Ok(default)
                }
            },
        }
    }
}

/// Numbers, and numbers stored as strings (older hosts stored some that way).
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Invalid setting: {0}")]
    Invalid(#[from] DomainError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockSettingsRepo;
    use mockall::predicate::eq;
    use std::collections::HashMap;

    fn repo_with(values: HashMap<&'static str, Value>) -> MockSettingsRepo {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get()
            .returning(move |key| Ok(values.get(key).cloned()));
        repo
    }

    #[tokio::test]
    async fn missing_settings_use_defaults() {
        let ops = SettingsOps::new(Arc::new(repo_with(HashMap::new())));
        let config = ops.tracker_config().await.expect("config");
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(ops.schema_version().await.expect("version"), SchemaVersion::UNSET);
    }

    #[tokio::test]
    async fn zero_or_malformed_interval_falls_back() {
        for raw in [json!(0), json!(-5), json!("soon"), json!(null)] {
            let ops = SettingsOps::new(Arc::new(repo_with(HashMap::from([(
                keys::TRACK_LIGHT_SOURCES_INTERVAL,
                raw.clone(),
            )]))));
            let config = ops.tracker_config().await.expect("config");
            assert_eq!(
                config.tick_interval_secs, DEFAULT_TICK_INTERVAL_SECS,
                "interval {raw} should fall back"
            );
        }
    }

    #[tokio::test]
    async fn reads_stored_values() {
        let ops = SettingsOps::new(Arc::new(repo_with(HashMap::from([
            (keys::TRACK_LIGHT_SOURCES, json!(false)),
            (keys::TRACK_LIGHT_SOURCES_INTERVAL, json!("30")),
            (keys::TRACK_INACTIVE_USER_LIGHT_SOURCES, json!(true)),
            (keys::SCHEMA_VERSION, json!(230501)),
        ]))));

        let config = ops.tracker_config().await.expect("config");
        assert!(!config.enabled);
        assert_eq!(config.tick_interval_secs, 30.0);
        assert!(config.pause_with_game);
        assert!(config.monitor_inactive);
        assert_eq!(
            ops.schema_version().await.expect("version"),
            SchemaVersion::from_const(230501.0)
        );
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_get()
            .returning(|_| Err(RepoError::database("settings", "disk gone")));
        let ops = SettingsOps::new(Arc::new(repo));
        assert!(matches!(
            ops.tracker_config().await,
            Err(SettingsError::Repo(_))
        ));
    }

    #[tokio::test]
    async fn writes_schema_version_as_number() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set()
            .with(eq(keys::SCHEMA_VERSION), eq(json!(230612.0)))
            .times(1)
            .returning(|_, _| Ok(()));
        let ops = SettingsOps::new(Arc::new(repo));
        ops.set_schema_version(SchemaVersion::from_const(230612.0))
            .await
            .expect("set");
    }

    #[tokio::test]
    async fn interval_writes_are_marked_as_seconds() {
        let mut repo = MockSettingsRepo::new();
        repo.expect_set()
            .with(eq(keys::TRACK_LIGHT_SOURCES_INTERVAL), eq(json!(2000.0)))
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_set()
            .with(
                eq(keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT),
                eq(json!(INTERVAL_UNIT_SECONDS)),
            )
            .times(1)
            .returning(|_, _| Ok(()));
        let ops = SettingsOps::new(Arc::new(repo));
        ops.set_tick_interval(2000.0).await.expect("set");
    }

    #[tokio::test]
    async fn rejects_non_positive_interval() {
        let ops = SettingsOps::new(Arc::new(MockSettingsRepo::new()));
        assert!(matches!(
            ops.set_tick_interval(0.0).await,
            Err(SettingsError::Invalid(_))
        ));
    }
}
