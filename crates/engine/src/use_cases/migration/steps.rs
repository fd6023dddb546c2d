//! Built-in migration steps, one per schema change.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use shadowdark_domain::{
    CombatPosition, DomainError, PartialUpdate, SchemaVersion, DEFAULT_LIGHT_LONGEVITY_MINS,
};

use super::{MigrationError, MigrationStep};
use crate::use_cases::settings::{keys, SettingsOps, INTERVAL_UNIT_SECONDS};

/// Every step this package ships, in no particular order.
pub fn builtin_steps() -> Vec<Arc<dyn MigrationStep>> {
    vec![
        Arc::new(LegacyCombatTime),
        Arc::new(LightFuel),
        Arc::new(TrackerIntervalSeconds),
    ]
}

// =============================================================================
// 230417.2: structured combat time
// =============================================================================

/// Effects used to record their starting combat position as a `"round.turn"`
/// string; it is now `{round, turn}`.
pub struct LegacyCombatTime;

#[async_trait]
impl MigrationStep for LegacyCombatTime {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::from_const(230417.2)
    }

    fn update_item(&self, item: &Value, _owner: Option<&Value>) -> Result<PartialUpdate, DomainError> {
        let mut update = PartialUpdate::new();
        if item.get("type").and_then(Value::as_str) != Some("Effect") {
            return Ok(update);
        }
        if let Some(legacy) = item
            .pointer("/system/start/combatTime")
            .and_then(Value::as_str)
        {
            let position = CombatPosition::parse_legacy(legacy)?;
            update.set(
                "system.start.combatTime",
                json!({"round": position.round, "turn": position.turn}),
            );
        }
        Ok(update)
    }
}

// =============================================================================
// 230501: light fuel
// =============================================================================

/// Light sources record their fuel in `system.light.remainingSecs`. Items
/// without it get a full burn; negative values clamp to empty.
pub struct LightFuel;

impl LightFuel {
    fn fuel_update(light: &Value, path: &str) -> Option<(String, Value)> {
        if light.get("isSource").and_then(Value::as_bool) != Some(true) {
            return None;
        }
        match light.get("remainingSecs") {
            None | Some(Value::Null) => {
                let longevity = light
                    .get("longevity")
                    .and_then(Value::as_f64)
                    .filter(|l| l.is_finite() && *l >= 0.0)
                    .unwrap_or(DEFAULT_LIGHT_LONGEVITY_MINS);
                Some((path.to_string(), json!(longevity * 60.0)))
            }
            Some(secs) if secs.as_f64().is_some_and(|s| s < 0.0) => {
                Some((path.to_string(), json!(0.0)))
            }
            Some(_) => None,
        }
    }
}

#[async_trait]
impl MigrationStep for LightFuel {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::from_const(230501.0)
    }

    /// Lights already dropped on the scene carry their item in
    /// `system.lightSource`.
    fn update_actor(&self, actor: &Value) -> Result<PartialUpdate, DomainError> {
        let mut update = PartialUpdate::new();
        if let Some(light) = actor.pointer("/system/lightSource/system/light") {
            if let Some((path, value)) =
                Self::fuel_update(light, "system.lightSource.system.light.remainingSecs")
            {
                update.set(path, value);
            }
        }
        Ok(update)
    }

    fn update_item(&self, item: &Value, _owner: Option<&Value>) -> Result<PartialUpdate, DomainError> {
        let mut update = PartialUpdate::new();
        if let Some(light) = item.pointer("/system/light") {
            if let Some((path, value)) = Self::fuel_update(light, "system.light.remainingSecs") {
                update.set(path, value);
            }
        }
        Ok(update)
    }
}

// =============================================================================
// 230612: tracker interval in seconds
// =============================================================================

/// The light tracking interval used to be stored in milliseconds.
///
/// The unit marker is written before the converted value and remembers the
/// legacy value, so a rerun after a crash between the two writes finishes the
/// conversion instead of dividing again.
pub struct TrackerIntervalSeconds;

#[async_trait]
impl MigrationStep for TrackerIntervalSeconds {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::from_const(230612.0)
    }

    async fn update_settings(&self, settings: &SettingsOps) -> Result<(), MigrationError> {
        let repo = settings.repo();
        let stored = repo
            .get(keys::TRACK_LIGHT_SOURCES_INTERVAL)
            .await?
            .as_ref()
            .and_then(Value::as_f64);

        let millis = match repo.get(keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT).await? {
            Some(marker) => {
                // Converted already, unless the value still equals the legacy one.
                let legacy = marker.get("legacyMillis").and_then(Value::as_f64);
                match (legacy, stored) {
                    (Some(legacy), Some(stored)) if legacy == stored => legacy,
                    _ => return Ok(()),
                }
            }
            None => {
                let Some(millis) = stored.filter(|m| m.is_finite() && *m > 0.0) else {
                    repo.set(
                        keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT,
                        json!(INTERVAL_UNIT_SECONDS),
                    )
                    .await?;
                    return Ok(());
                };
                repo.set(
                    keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT,
                    json!({"unit": INTERVAL_UNIT_SECONDS, "legacyMillis": millis}),
                )
                .await?;
                millis
            }
        };

        let seconds = millis / 1000.0;
        repo.set(keys::TRACK_LIGHT_SOURCES_INTERVAL, json!(seconds))
            .await?;
        tracing::info!(millis, seconds, "Converted light tracking interval to seconds");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{effect, lit_torch, unlit_torch, InMemorySettingsRepo};

    fn applied(source: &Value, update: &PartialUpdate) -> Value {
        let mut source = source.clone();
        update.apply_to(&mut source);
        source
    }

    #[test]
    fn builtin_versions_are_distinct() {
        let mut versions: Vec<SchemaVersion> = builtin_steps().iter().map(|s| s.version()).collect();
        versions.sort();
        versions.dedup();
        assert_eq!(versions.len(), 3);
    }

    #[test]
    fn legacy_combat_time_becomes_structured() {
        let item = effect("Shield", "rounds", 3.0, json!({"value": 0, "combatTime": "4.2"}));
        let update = LegacyCombatTime.update_item(&item, None).expect("migrate");
        let migrated = applied(&item, &update);
        assert_eq!(
            migrated["system"]["start"]["combatTime"],
            json!({"round": 4, "turn": 2})
        );

        let again = LegacyCombatTime.update_item(&migrated, None).expect("migrate");
        assert!(again.is_empty());
    }

    #[test]
    fn unparseable_combat_time_is_an_error() {
        let item = effect("Shield", "rounds", 3.0, json!({"combatTime": "soon"}));
        assert!(LegacyCombatTime.update_item(&item, None).is_err());
    }

    #[test]
    fn unlit_light_gets_full_fuel() {
        let item = unlit_torch();
        let update = LightFuel.update_item(&item, None).expect("migrate");
        assert_eq!(update.get("system.light.remainingSecs"), Some(&json!(3600.0)));

        let again = LightFuel
            .update_item(&applied(&item, &update), None)
            .expect("migrate");
        assert!(again.is_empty());
    }

    #[test]
    fn negative_fuel_clamps_to_empty() {
        let item = lit_torch(-30.0);
        let update = LightFuel.update_item(&item, None).expect("migrate");
        assert_eq!(update.get("system.light.remainingSecs"), Some(&json!(0.0)));
        assert!(LightFuel.update_item(&lit_torch(120.0), None).expect("migrate").is_empty());
    }

    #[test]
    fn dropped_light_actor_gets_fuel() {
        let actor = json!({
            "name": "Torch",
            "type": "Light",
            "system": {"lightSource": unlit_torch()}
        });
        let update = LightFuel.update_actor(&actor).expect("migrate");
        assert_eq!(
            update.get("system.lightSource.system.light.remainingSecs"),
            Some(&json!(3600.0))
        );
    }

    async fn run_interval_step(settings: &SettingsOps) {
        TrackerIntervalSeconds
            .update_settings(settings)
            .await
            .expect("migrate");
    }

    #[tokio::test]
    async fn millisecond_interval_becomes_seconds_once() {
        let repo = Arc::new(
            InMemorySettingsRepo::new().with(keys::TRACK_LIGHT_SOURCES_INTERVAL, json!(1_000_000)),
        );
        let settings = SettingsOps::new(repo.clone());

        run_interval_step(&settings).await;
        assert_eq!(repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL), Some(json!(1000.0)));

        run_interval_step(&settings).await;
        assert_eq!(repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL), Some(json!(1000.0)));
    }

    #[tokio::test]
    async fn interval_already_in_seconds_is_left_alone() {
        let repo = Arc::new(InMemorySettingsRepo::new());
        let settings = SettingsOps::new(repo.clone());
        settings.set_tick_interval(2000.0).await.expect("set");

        run_interval_step(&settings).await;
        assert_eq!(repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL), Some(json!(2000.0)));
    }

    #[tokio::test]
    async fn interrupted_conversion_finishes_on_rerun() {
        // Marker written, converted value not yet stored.
        let repo = Arc::new(
            InMemorySettingsRepo::new()
                .with(keys::TRACK_LIGHT_SOURCES_INTERVAL, json!(60000.0))
                .with(
                    keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT,
                    json!({"unit": "seconds", "legacyMillis": 60000.0}),
                ),
        );
        let settings = SettingsOps::new(repo.clone());

        run_interval_step(&settings).await;
        assert_eq!(repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL), Some(json!(60.0)));
        run_interval_step(&settings).await;
        assert_eq!(repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL), Some(json!(60.0)));
    }

    #[tokio::test]
    async fn missing_interval_is_marked_as_seconds() {
        let repo = Arc::new(InMemorySettingsRepo::new());
        let settings = SettingsOps::new(repo.clone());

        run_interval_step(&settings).await;
        assert_eq!(repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL), None);
        assert_eq!(
            repo.value(keys::TRACK_LIGHT_SOURCES_INTERVAL_UNIT),
            Some(json!(INTERVAL_UNIT_SECONDS))
        );
    }
}
