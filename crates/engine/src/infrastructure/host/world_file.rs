//! World fixtures: a JSON file describing users, documents, packs and the
//! clock, used to seed the in-memory host stand-in.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use shadowdark_domain::{ActorId, ClockReading, CombatPosition, UserId};
use uuid::Uuid;

use super::{InMemoryCompendiums, InMemoryDocumentStore, InMemoryUsers};
use crate::infrastructure::ports::{PackDocumentKind, PackageType, RepoError, UserRecord};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldFixture {
    #[serde(default)]
    pub users: Vec<UserFixture>,
    #[serde(default)]
    pub actors: Vec<Value>,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub packs: Vec<PackFixture>,
    #[serde(default)]
    pub clock: ClockFixture,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFixture {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub gm: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    /// `_id` of the actor this user plays.
    #[serde(default)]
    pub character: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackFixture {
    pub collection: String,
    #[serde(rename = "type")]
    pub document_kind: PackDocumentKind,
    pub package_type: PackageType,
    #[serde(default = "default_true")]
    pub locked: bool,
    #[serde(default)]
    pub actors: Vec<Value>,
    #[serde(default)]
    pub items: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockFixture {
    #[serde(default)]
    pub world_time: f64,
    #[serde(default)]
    pub combat: Option<CombatPosition>,
    #[serde(default)]
    pub paused: bool,
}

fn default_true() -> bool {
    true
}

impl WorldFixture {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RepoError::database("load_world", format!("{}: {}", path.display(), e)))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, RepoError> {
        serde_json::from_str(raw).map_err(RepoError::serialization)
    }

    pub fn clock_reading(&self) -> ClockReading {
        ClockReading {
            world_time: self.clock.world_time,
            combat: self.clock.combat,
            paused: self.clock.paused,
        }
    }

    /// Load every document, pack and user into the given stores.
    pub async fn seed(
        &self,
        world: &InMemoryDocumentStore,
        compendiums: &InMemoryCompendiums,
        users: &InMemoryUsers,
    ) -> Result<(), RepoError> {
        for actor in &self.actors {
            world.insert_actor(actor.clone()).await;
        }
        for item in &self.items {
            world.insert_item(None, item.clone()).await?;
        }

        for pack in &self.packs {
            let (_, store) = compendiums
                .add_pack(
                    pack.collection.clone(),
                    pack.document_kind,
                    pack.package_type,
                    pack.locked,
                )
                .await;
            for actor in &pack.actors {
                store.insert_actor(actor.clone()).await;
            }
            for item in &pack.items {
                store.insert_item(None, item.clone()).await?;
            }
        }

        for user in &self.users {
            users
                .add(UserRecord {
                    id: user.id.map(UserId::from_uuid).unwrap_or_default(),
                    name: user.name.clone(),
                    is_gm: user.gm,
                    active: user.active,
                    character: user.character.map(ActorId::from_uuid),
                })
                .await;
        }

        tracing::info!(
            actors = self.actors.len(),
            items = self.items.len(),
            packs = self.packs.len(),
            users = self.users.len(),
            "Seeded world"
        );
        Ok(())
    }
}
