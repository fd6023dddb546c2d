//! Dropping carried lights onto the scene and picking them back up.
//!
//! A dropped light becomes a standalone `Light` actor whose
//! `system.lightSource` holds the original item source, so picking it up
//! restores the same item (id, remaining fuel and all).

use std::sync::Arc;

use serde_json::{json, Value};
use shadowdark_domain::{ActorId, AuthorityRole, DomainError, HostDocument, ItemId};
use shadowdark_shared::{DropPosition, RelayMessage};

use crate::infrastructure::ports::{
    DocumentRef, DocumentRepo, MessageRelayPort, RelayError, RepoError,
};
use crate::use_cases::light_tracker::{LightSourceTracker, TrackerError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneLightOutcome {
    /// Sent to the authoritative process.
    Forwarded,
    Dropped { light_actor_id: ActorId },
    PickedUp { item_id: ItemId },
}

pub struct LightSceneOps {
    documents: Arc<dyn DocumentRepo>,
    tracker: Arc<LightSourceTracker>,
    relay: Arc<dyn MessageRelayPort>,
    role: AuthorityRole,
}

impl LightSceneOps {
    pub fn new(
        documents: Arc<dyn DocumentRepo>,
        tracker: Arc<LightSourceTracker>,
        relay: Arc<dyn MessageRelayPort>,
        role: AuthorityRole,
    ) -> Self {
        Self {
            documents,
            tracker,
            relay,
            role,
        }
    }

    /// Move `item_id` out of `owner_id`'s inventory onto the scene.
    pub async fn drop_light(
        &self,
        owner_id: ActorId,
        item_id: ItemId,
        position: DropPosition,
    ) -> Result<SceneLightOutcome, SceneLightError> {
        if !self.role.is_authoritative() {
            self.relay
                .send(RelayMessage::DropLightSourceOnScene {
                    item_id: item_id.to_uuid(),
                    item_owner_id: owner_id.to_uuid(),
                    position,
                })
                .await?;
            return Ok(SceneLightOutcome::Forwarded);
        }

        let item = self
            .documents
            .get_item(Some(owner_id), item_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Item", item_id.to_string()))?;
        let Some(light) = item.valid().filter(|i| i.is_light()) else {
            return Err(DomainError::validation(format!(
                "'{}' is not a light source",
                item.name()
            ))
            .into());
        };

        let light_actor_id = self
            .documents
            .create_actor(json!({
                "name": light.name(),
                "type": "Light",
                "system": {
                    "lightSource": light.source(),
                    "position": {"x": position.x, "y": position.y},
                },
            }))
            .await?;
        if let Err(e) = self
            .documents
            .delete(DocumentRef::EmbeddedItem {
                actor: owner_id,
                item: item_id,
            })
            .await
        {
            // Keep exactly one copy of the light.
            if let Err(rollback) = self
                .documents
                .delete(DocumentRef::Actor(light_actor_id))
                .await
            {
                tracing::error!(
                    light_actor_id = %light_actor_id,
                    error = %rollback,
                    "Failed to remove light actor after a failed drop"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            actor_id = %owner_id,
            item_id = %item_id,
            light_actor_id = %light_actor_id,
            "Light source dropped on scene"
        );
        self.tracker.refresh().await?;
        Ok(SceneLightOutcome::Dropped { light_actor_id })
    }

    /// Move the light carried by `light_actor_id` into `character_id`'s
    /// inventory and remove the light actor.
    pub async fn pickup_light(
        &self,
        character_id: ActorId,
        light_actor_id: ActorId,
    ) -> Result<SceneLightOutcome, SceneLightError> {
        if !self.role.is_authoritative() {
            self.relay
                .send(RelayMessage::PickupLightSourceFromScene {
                    character_id: character_id.to_uuid(),
                    light_actor_id: light_actor_id.to_uuid(),
                })
                .await?;
            return Ok(SceneLightOutcome::Forwarded);
        }

        let light_actor = self
            .documents
            .get_actor(light_actor_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Actor", light_actor_id.to_string()))?;
        let carried: Value = light_actor
            .valid()
            .and_then(|a| a.carried_light())
            .cloned()
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "'{}' does not carry a light source",
                    light_actor.name()
                ))
            })?;

        // Fail before touching anything if the character is gone.
        if self.documents.get_actor(character_id).await?.is_none() {
            return Err(DomainError::not_found("Actor", character_id.to_string()).into());
        }

        let item_id = self
            .documents
            .create_item(Some(character_id), carried)
            .await?;
        self.documents
            .delete(DocumentRef::Actor(light_actor_id))
            .await?;

        tracing::info!(
            actor_id = %character_id,
            item_id = %item_id,
            light_actor_id = %light_actor_id,
            "Light source picked up from scene"
        );
        self.tracker.refresh().await?;
        Ok(SceneLightOutcome::PickedUp { item_id })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SceneLightError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}
