//! In-memory stand-in for the host document store.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use shadowdark_domain::{
    ActorDocument, ActorId, DocumentEntry, ItemDocument, ItemId, PartialUpdate, RawDocument,
};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{DocumentRef, DocumentRepo, RepoError};

struct StoredItem {
    id: ItemId,
    source: Value,
}

struct StoredActor {
    id: ActorId,
    source: Value,
    items: Vec<StoredItem>,
}

#[derive(Default)]
struct StoreState {
    actors: Vec<StoredActor>,
    items: Vec<StoredItem>,
}

impl StoreState {
    fn actor(&self, id: ActorId) -> Option<&StoredActor> {
        self.actors.iter().find(|a| a.id == id)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut StoredActor> {
        self.actors.iter_mut().find(|a| a.id == id)
    }

    fn items_of(&self, owner: Option<ActorId>) -> Option<&Vec<StoredItem>> {
        match owner {
            Some(actor) => self.actor(actor).map(|a| &a.items),
            None => Some(&self.items),
        }
    }

    fn items_of_mut(&mut self, owner: Option<ActorId>) -> Option<&mut Vec<StoredItem>> {
        match owner {
            Some(actor) => self.actor_mut(actor).map(|a| &mut a.items),
            None => Some(&mut self.items),
        }
    }
}

/// Actors, their embedded items, and world-level items, held as raw JSON.
///
/// Sources are validated on every read, so a document that fails validation is
/// listed as [`DocumentEntry::Invalid`] rather than dropped. A locked store
/// refuses writes, like a locked compendium pack.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    state: RwLock<StoreState>,
    locked: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Insert an actor source as-is, splitting out any embedded `items` array.
    ///
    /// Unlike [`DocumentRepo::create_actor`] this ignores the lock, for seeding.
    pub async fn insert_actor(&self, mut source: Value) -> ActorId {
        let embedded = take_embedded_items(&mut source);
        let id: ActorId = ensure_id(&mut source);
        let items = embedded
            .into_iter()
            .map(|mut item| StoredItem {
                id: ensure_id(&mut item),
                source: item,
            })
            .collect();

        self.state.write().await.actors.push(StoredActor { id, source, items });
        id
    }

    /// Insert an item source as-is, embedded in `parent` when given.
    pub async fn insert_item(
        &self,
        parent: Option<ActorId>,
        mut source: Value,
    ) -> Result<ItemId, RepoError> {
        let id: ItemId = ensure_id(&mut source);
        let mut state = self.state.write().await;
        let items = state
            .items_of_mut(parent)
            .ok_or_else(|| RepoError::not_found("Actor", display_owner(parent)))?;
        items.push(StoredItem { id, source });
        Ok(id)
    }

    /// Raw source of a document, for assertions and fixtures.
    pub async fn source(&self, target: DocumentRef) -> Option<Value> {
        let state = self.state.read().await;
        match target {
            DocumentRef::Actor(id) => state.actor(id).map(|a| a.source.clone()),
            DocumentRef::Item(id) => find_item(&state.items, id).map(|i| i.source.clone()),
            DocumentRef::EmbeddedItem { actor, item } => state
                .actor(actor)
                .and_then(|a| find_item(&a.items, item))
                .map(|i| i.source.clone()),
        }
    }

    fn ensure_unlocked(&self, operation: &str) -> Result<(), RepoError> {
        if self.is_locked() {
            return Err(RepoError::constraint(format!(
                "cannot {} in a locked collection",
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRepo for InMemoryDocumentStore {
    async fn get_actor(
        &self,
        id: ActorId,
    ) -> Result<Option<DocumentEntry<ActorDocument>>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .actor(id)
            .map(|a| actor_entry(a.id, a.source.clone())))
    }

    async fn get_item(
        &self,
        owner: Option<ActorId>,
        id: ItemId,
    ) -> Result<Option<DocumentEntry<ItemDocument>>, RepoError> {
        let state = self.state.read().await;
        let items = state
            .items_of(owner)
            .ok_or_else(|| RepoError::not_found("Actor", display_owner(owner)))?;
        Ok(find_item(items, id).map(|i| item_entry(i.id, i.source.clone())))
    }

    async fn list_actors(&self) -> Result<Vec<DocumentEntry<ActorDocument>>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .actors
            .iter()
            .map(|a| actor_entry(a.id, a.source.clone()))
            .collect())
    }

    async fn list_items(&self) -> Result<Vec<DocumentEntry<ItemDocument>>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .map(|i| item_entry(i.id, i.source.clone()))
            .collect())
    }

    async fn list_embedded_items(
        &self,
        actor_id: ActorId,
    ) -> Result<Vec<DocumentEntry<ItemDocument>>, RepoError> {
        let state = self.state.read().await;
        let actor = state
            .actor(actor_id)
            .ok_or_else(|| RepoError::not_found("Actor", actor_id))?;
        Ok(actor
            .items
            .iter()
            .map(|i| item_entry(i.id, i.source.clone()))
            .collect())
    }

    async fn create_actor(&self, source: Value) -> Result<ActorId, RepoError> {
        self.ensure_unlocked("create an actor")?;
        let id = self.insert_actor(source).await;
        tracing::debug!(actor_id = %id, "Created actor");
        Ok(id)
    }

    async fn create_item(
        &self,
        parent: Option<ActorId>,
        source: Value,
    ) -> Result<ItemId, RepoError> {
        self.ensure_unlocked("create an item")?;
        let id = self.insert_item(parent, source).await?;
        tracing::debug!(item_id = %id, parent = ?parent, "Created item");
        Ok(id)
    }

    async fn update(&self, target: DocumentRef, update: &PartialUpdate) -> Result<(), RepoError> {
        self.ensure_unlocked("update a document")?;
        let mut state = self.state.write().await;
        let source = match target {
            DocumentRef::Actor(id) => state.actor_mut(id).map(|a| &mut a.source),
            DocumentRef::Item(id) => find_item_mut(&mut state.items, id).map(|i| &mut i.source),
            DocumentRef::EmbeddedItem { actor, item } => state
                .actor_mut(actor)
                .and_then(|a| find_item_mut(&mut a.items, item))
                .map(|i| &mut i.source),
        }
        .ok_or_else(|| RepoError::not_found(target.kind(), target))?;

        update.apply_to(source);
        Ok(())
    }

    async fn delete(&self, target: DocumentRef) -> Result<(), RepoError> {
        self.ensure_unlocked("delete a document")?;
        let mut state = self.state.write().await;
        let removed = match target {
            DocumentRef::Actor(id) => remove_where(&mut state.actors, |a| a.id == id),
            DocumentRef::Item(id) => remove_where(&mut state.items, |i| i.id == id),
            DocumentRef::EmbeddedItem { actor, item } => state
                .actor_mut(actor)
                .is_some_and(|a| remove_where(&mut a.items, |i| i.id == item)),
        };

        if removed {
            Ok(())
        } else {
            Err(RepoError::not_found(target.kind(), target))
        }
    }
}

fn actor_entry(id: ActorId, source: Value) -> DocumentEntry<ActorDocument> {
    match ActorDocument::from_source(source.clone()) {
        Ok(doc) => DocumentEntry::Valid(doc),
        Err(e) => {
            tracing::debug!(actor_id = %id, error = %e, "Actor failed validation");
            DocumentEntry::Invalid(RawDocument::new(id, source))
        }
    }
}

fn item_entry(id: ItemId, source: Value) -> DocumentEntry<ItemDocument> {
    match ItemDocument::from_source(source.clone()) {
        Ok(doc) => DocumentEntry::Valid(doc),
        Err(e) => {
            tracing::debug!(item_id = %id, error = %e, "Item failed validation");
            DocumentEntry::Invalid(RawDocument::new(id, source))
        }
    }
}

fn find_item(items: &[StoredItem], id: ItemId) -> Option<&StoredItem> {
    items.iter().find(|i| i.id == id)
}

fn find_item_mut(items: &mut [StoredItem], id: ItemId) -> Option<&mut StoredItem> {
    items.iter_mut().find(|i| i.id == id)
}

fn remove_where<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|i| !pred(i));
    items.len() != before
}

fn display_owner(owner: Option<ActorId>) -> String {
    owner.map(|id| id.to_string()).unwrap_or_else(|| "world".to_string())
}

/// Read `_id`, assigning a fresh one when missing or malformed.
fn ensure_id<I>(source: &mut Value) -> I
where
    I: std::str::FromStr + Default + std::fmt::Display,
{
    if let Some(id) = source
        .get("_id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<I>().ok())
    {
        return id;
    }

    let id = I::default();
    if !source.is_object() {
        *source = Value::Object(Map::new());
    }
    if let Value::Object(map) = source {
        map.insert("_id".to_string(), Value::String(id.to_string()));
    }
    id
}

fn take_embedded_items(source: &mut Value) -> Vec<Value> {
    match source.as_object_mut().and_then(|m| m.remove("items")) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}
