//! Store port traits: host documents, compendium packs, users and settings.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shadowdark_domain::{
    ActorDocument, ActorId, DocumentEntry, ItemDocument, ItemId, PackId, PartialUpdate, UserId,
};

use super::error::RepoError;
use super::types::{CompendiumPack, DocumentRef, UserRecord};

// =============================================================================
// Settings Storage
// =============================================================================

/// Named, process-wide settings stored as JSON values.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, RepoError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), RepoError>;
}

// =============================================================================
// Host Document Store
// =============================================================================

/// A collection of actors and items: the world, or a single compendium pack.
///
/// Listings include documents that fail validation as
/// [`DocumentEntry::Invalid`] so batch operations can still reach them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepo: Send + Sync {
    async fn get_actor(
        &self,
        id: ActorId,
    ) -> Result<Option<DocumentEntry<ActorDocument>>, RepoError>;

    /// An item by id; `owner` selects an actor's embedded items.
    async fn get_item(
        &self,
        owner: Option<ActorId>,
        id: ItemId,
    ) -> Result<Option<DocumentEntry<ItemDocument>>, RepoError>;

    async fn list_actors(&self) -> Result<Vec<DocumentEntry<ActorDocument>>, RepoError>;

    /// Items not embedded in any actor.
    async fn list_items(&self) -> Result<Vec<DocumentEntry<ItemDocument>>, RepoError>;

    async fn list_embedded_items(
        &self,
        actor_id: ActorId,
    ) -> Result<Vec<DocumentEntry<ItemDocument>>, RepoError>;

    /// Create an actor; an `_id` is assigned when the source has none.
    async fn create_actor(&self, source: Value) -> Result<ActorId, RepoError>;

    /// Create an item, embedded in `parent` when given.
    async fn create_item(&self, parent: Option<ActorId>, source: Value)
        -> Result<ItemId, RepoError>;

    async fn update(&self, target: DocumentRef, update: &PartialUpdate) -> Result<(), RepoError>;

    /// Delete a document. Deleting an actor deletes its embedded items.
    async fn delete(&self, target: DocumentRef) -> Result<(), RepoError>;
}

// =============================================================================
// Compendium Packs
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompendiumRepo: Send + Sync {
    async fn list_packs(&self) -> Result<Vec<CompendiumPack>, RepoError>;
    async fn set_locked(&self, pack: PackId, locked: bool) -> Result<(), RepoError>;

    /// Ask the host to bring the pack's stored documents up to its own schema.
    async fn migrate_schema(&self, pack: PackId) -> Result<(), RepoError>;

    /// The documents of one pack, addressed like the world store.
    async fn documents(&self, pack: PackId) -> Result<Arc<dyn DocumentRepo>, RepoError>;
}

// =============================================================================
// Users
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;
    async fn get_user(&self, id: UserId) -> Result<Option<UserRecord>, RepoError>;
}
