use std::sync::Arc;

use serde_json::{json, Value};
use shadowdark_domain::{ActorId, DomainError, EffectDuration, ItemId, PartialUpdate};

use super::EffectError;
use crate::infrastructure::ports::{DocumentRepo, GameClockPort, Notice, NotificationPort};

/// Creates effect items on actors, recording when they began.
pub struct EffectOps {
    documents: Arc<dyn DocumentRepo>,
    game_clock: Arc<dyn GameClockPort>,
    notifier: Arc<dyn NotificationPort>,
}

impl EffectOps {
    pub fn new(
        documents: Arc<dyn DocumentRepo>,
        game_clock: Arc<dyn GameClockPort>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self {
            documents,
            game_clock,
            notifier,
        }
    }

    /// Create an Effect item on `owner`, stamping `system.start` with the
    /// current world time and combat position.
    ///
    /// A rounds-based effect needs a combat position to count from, so one
    /// created outside combat is refused with a warning.
    pub async fn create_effect(
        &self,
        owner: ActorId,
        mut source: Value,
    ) -> Result<ItemId, EffectError> {
        if source.get("type").and_then(Value::as_str) != Some("Effect") {
            return Err(DomainError::validation("only Effect items carry a start time").into());
        }

        let clock = self.game_clock.reading();
        let duration: Option<EffectDuration> = source
            .pointer("/system/duration")
            .and_then(|d| serde_json::from_value(d.clone()).ok());

        if duration.is_some_and(|d| d.unit.is_rounds()) && clock.combat.is_none() {
            tracing::warn!(actor_id = %owner, "Refusing rounds-based effect outside combat");
            self.notifier.notify(Notice::warning(
                "Effects lasting a number of rounds can only be created during combat",
            ));
            return Err(EffectError::RequiresCombat);
        }

        PartialUpdate::new()
            .with(
                "system.start",
                json!({
                    "value": clock.world_time,
                    "combatTime": clock.combat,
                }),
            )
            .apply_to(&mut source);

        let item_id = self.documents.create_item(Some(owner), source).await?;
        tracing::info!(
            actor_id = %owner,
            item_id = %item_id,
            world_time = clock.world_time,
            "Effect created"
        );
        Ok(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SharedGameClock;
    use crate::infrastructure::host::InMemoryDocumentStore;
    use crate::infrastructure::ports::{DocumentRef, NoticeLevel};
    use crate::test_fixtures::{effect, player, RecordingNotifier};
    use shadowdark_domain::ClockReading;

    struct Fixture {
        store: Arc<InMemoryDocumentStore>,
        clock: Arc<SharedGameClock>,
        notifier: Arc<RecordingNotifier>,
        ops: EffectOps,
    }

    fn fixture(world_time: f64) -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let clock = Arc::new(SharedGameClock::new(ClockReading::at(world_time)));
        let notifier = Arc::new(RecordingNotifier::new());
        let ops = EffectOps::new(store.clone(), clock.clone(), notifier.clone());
        Fixture {
            store,
            clock,
            notifier,
            ops,
        }
    }

    #[tokio::test]
    async fn stamps_world_time_outside_combat() {
        let f = fixture(1000.0);
        let actor = f.store.insert_actor(player("Kira")).await;

        let item = f
            .ops
            .create_effect(actor, effect("Bless", "minutes", 5.0, Value::Null))
            .await
            .expect("created");

        let source = f
            .store
            .source(DocumentRef::EmbeddedItem { actor, item })
            .await
            .expect("stored");
        assert_eq!(
            source["system"]["start"],
            json!({"value": 1000.0, "combatTime": null})
        );
    }

    #[tokio::test]
    async fn stamps_combat_position_during_combat() {
        let f = fixture(50.0);
        f.clock.begin_combat();
        let actor = f.store.insert_actor(player("Kira")).await;

        let item = f
            .ops
            .create_effect(actor, effect("Shield", "rounds", 3.0, Value::Null))
            .await
            .expect("created");

        let source = f
            .store
            .source(DocumentRef::EmbeddedItem { actor, item })
            .await
            .expect("stored");
        assert_eq!(
            source["system"]["start"]["combatTime"],
            json!({"round": 1, "turn": 0})
        );
    }

    #[tokio::test]
    async fn rounds_effect_refused_outside_combat() {
        let f = fixture(0.0);
        let actor = f.store.insert_actor(player("Kira")).await;

        let result = f
            .ops
            .create_effect(actor, effect("Shield", "rounds", 3.0, Value::Null))
            .await;

        assert!(matches!(result, Err(EffectError::RequiresCombat)));
        assert_eq!(f.notifier.count(NoticeLevel::Warning), 1);
        assert!(f
            .store
            .list_embedded_items(actor)
            .await
            .expect("items")
            .is_empty());
    }

    #[tokio::test]
    async fn rejects_non_effect_items() {
        let f = fixture(0.0);
        let actor = f.store.insert_actor(player("Kira")).await;
        let result = f
            .ops
            .create_effect(actor, json!({"name": "Rope", "type": "Basic"}))
            .await;
        assert!(matches!(result, Err(EffectError::Domain(_))));
    }
}
