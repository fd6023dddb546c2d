//! Authoritative-side handling of relay messages sent by delegates.

use std::sync::Arc;

use shadowdark_domain::{ActorId, AuthorityRole, ItemId};
use shadowdark_shared::{RelayEnvelope, RelayMessage};
use tokio::sync::{mpsc, watch};

use crate::use_cases::light_tracker::{LightSourceTracker, TrackerError};
use crate::use_cases::scene_light::{LightSceneOps, SceneLightError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// Not on the system channel, an unknown type, or this process is not
    /// authoritative.
    Ignored,
}

pub struct RelayDispatcher {
    tracker: Arc<LightSourceTracker>,
    scene: Arc<LightSceneOps>,
    role: AuthorityRole,
}

impl RelayDispatcher {
    pub fn new(
        tracker: Arc<LightSourceTracker>,
        scene: Arc<LightSceneOps>,
        role: AuthorityRole,
    ) -> Self {
        Self {
            tracker,
            scene,
            role,
        }
    }

    pub async fn dispatch(&self, envelope: RelayEnvelope) -> Result<DispatchOutcome, DispatchError> {
        if !envelope.is_system_channel() || !self.role.is_authoritative() {
            return Ok(DispatchOutcome::Ignored);
        }

        tracing::debug!(
            message_type = envelope.message.type_name(),
            sender = ?envelope.sender,
            "Relay message received"
        );

        match envelope.message {
            RelayMessage::ToggleLightSource { actor_id, item_id } => {
                self.tracker
                    .toggle(ActorId::from_uuid(actor_id), ItemId::from_uuid(item_id))
                    .await?;
            }
            RelayMessage::DropLightSourceOnScene {
                item_id,
                item_owner_id,
                position,
            } => {
                self.scene
                    .drop_light(
                        ActorId::from_uuid(item_owner_id),
                        ItemId::from_uuid(item_id),
                        position,
                    )
                    .await?;
            }
            RelayMessage::PickupLightSourceFromScene {
                character_id,
                light_actor_id,
            } => {
                self.scene
                    .pickup_light(
                        ActorId::from_uuid(character_id),
                        ActorId::from_uuid(light_actor_id),
                    )
                    .await?;
            }
            RelayMessage::Unknown => return Ok(DispatchOutcome::Ignored),
        }
        Ok(DispatchOutcome::Handled)
    }

    /// Handle envelopes until the channel closes or `shutdown` flips to true.
    pub async fn run(
        self: Arc<Self>,
        mut inbox: mpsc::Receiver<RelayEnvelope>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                envelope = inbox.recv() => {
                    let Some(envelope) = envelope else {
                        break;
                    };
                    let message_type = envelope.message.type_name();
                    if let Err(e) = self.dispatch(envelope).await {
                        tracing::error!(message_type, error = %e, "Failed to handle relay message");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Relay dispatcher stopped");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error("Scene light error: {0}")]
    SceneLight(#[from] SceneLightError),
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shadowdark_domain::{ClockReading, HostDocument};
    use shadowdark_shared::DropPosition;

    use super::*;
    use crate::infrastructure::clock::SharedGameClock;
    use crate::infrastructure::host::{InMemoryDocumentStore, InMemoryUsers};
    use crate::infrastructure::ports::{DocumentRepo, MockMessageRelayPort};
    use crate::infrastructure::relay::ChannelRelay;
    use crate::test_fixtures::{lit_torch, player, InMemorySettingsRepo, RecordingNotifier};
    use crate::use_cases::settings::SettingsOps;

    struct Fixture {
        store: Arc<InMemoryDocumentStore>,
        tracker: Arc<LightSourceTracker>,
        dispatcher: Arc<RelayDispatcher>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDocumentStore::new());
        let users = Arc::new(InMemoryUsers::new());
        let relay = Arc::new(MockMessageRelayPort::new());
        let tracker = Arc::new(LightSourceTracker::new(
            store.clone(),
            users.clone(),
            Arc::new(SettingsOps::new(Arc::new(InMemorySettingsRepo::new()))),
            Arc::new(SharedGameClock::new(ClockReading::at(0.0))),
            relay.clone(),
            Arc::new(RecordingNotifier::new()),
            AuthorityRole::Authoritative,
        ));
        let scene = Arc::new(LightSceneOps::new(
            store.clone(),
            tracker.clone(),
            relay,
            AuthorityRole::Authoritative,
        ));
        let dispatcher = Arc::new(RelayDispatcher::new(
            tracker.clone(),
            scene,
            AuthorityRole::Authoritative,
        ));
        Fixture {
            store,
            tracker,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn ignores_foreign_channels_and_unknown_types() {
        let f = fixture().await;
        let mut foreign = RelayEnvelope::new(None, RelayMessage::Unknown);
        foreign.channel = "module.other".to_string();
        assert_eq!(
            f.dispatcher.dispatch(foreign).await.expect("dispatch"),
            DispatchOutcome::Ignored
        );
        assert_eq!(
            f.dispatcher
                .dispatch(RelayEnvelope::new(None, RelayMessage::Unknown))
                .await
                .expect("dispatch"),
            DispatchOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn delegate_requests_reach_the_scene() {
        let f = fixture().await;
        let mut source = player("Kira");
        source["items"] = json!([lit_torch(600.0)]);
        let kira = f.store.insert_actor(source).await;
        let torch = f.store.list_embedded_items(kira).await.expect("items")[0].id();

        // A delegate's relay publishes into the channel the dispatcher reads.
        let (delegate_relay, inbox) = ChannelRelay::channel(8);
        let delegate_scene = LightSceneOps::new(
            f.store.clone(),
            f.tracker.clone(),
            Arc::new(delegate_relay),
            AuthorityRole::Delegate,
        );
        delegate_scene
            .drop_light(kira, torch, DropPosition { x: 1.0, y: 2.0 })
            .await
            .expect("forwarded");
        drop(delegate_scene);

        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        f.dispatcher.clone().run(inbox, shutdown_rx).await;

        assert!(f
            .store
            .list_embedded_items(kira)
            .await
            .expect("items")
            .is_empty());
        let lights: Vec<_> = f
            .store
            .list_actors()
            .await
            .expect("actors")
            .into_iter()
            .filter_map(|a| a.valid().filter(|a| a.is_light()).map(|a| a.id()))
            .collect();
        assert_eq!(lights.len(), 1);
    }
}
