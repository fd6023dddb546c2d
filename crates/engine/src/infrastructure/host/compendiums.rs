//! In-memory compendium packs, each backed by its own document store.

use std::sync::Arc;

use async_trait::async_trait;
use shadowdark_domain::PackId;
use tokio::sync::RwLock;

use super::documents::InMemoryDocumentStore;
use crate::infrastructure::ports::{
    CompendiumPack, CompendiumRepo, DocumentRepo, PackDocumentKind, PackageType, RepoError,
};

struct StoredPack {
    id: PackId,
    collection: String,
    document_kind: PackDocumentKind,
    package_type: PackageType,
    store: Arc<InMemoryDocumentStore>,
}

impl StoredPack {
    fn describe(&self) -> CompendiumPack {
        CompendiumPack {
            id: self.id,
            collection: self.collection.clone(),
            document_kind: self.document_kind,
            package_type: self.package_type,
            locked: self.store.is_locked(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryCompendiums {
    packs: RwLock<Vec<StoredPack>>,
}

impl InMemoryCompendiums {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pack; returns its id and the store holding its documents.
    pub async fn add_pack(
        &self,
        collection: impl Into<String>,
        document_kind: PackDocumentKind,
        package_type: PackageType,
        locked: bool,
    ) -> (PackId, Arc<InMemoryDocumentStore>) {
        let id = PackId::new();
        let store = Arc::new(InMemoryDocumentStore::new());
        store.set_locked(locked);

        self.packs.write().await.push(StoredPack {
            id,
            collection: collection.into(),
            document_kind,
            package_type,
            store: store.clone(),
        });
        (id, store)
    }

    async fn store(&self, pack: PackId) -> Result<Arc<InMemoryDocumentStore>, RepoError> {
        self.packs
            .read()
            .await
            .iter()
            .find(|p| p.id == pack)
            .map(|p| p.store.clone())
            .ok_or_else(|| RepoError::not_found("Compendium", pack))
    }
}

#[async_trait]
impl CompendiumRepo for InMemoryCompendiums {
    async fn list_packs(&self) -> Result<Vec<CompendiumPack>, RepoError> {
        Ok(self.packs.read().await.iter().map(StoredPack::describe).collect())
    }

    async fn set_locked(&self, pack: PackId, locked: bool) -> Result<(), RepoError> {
        self.store(pack).await?.set_locked(locked);
        Ok(())
    }

    async fn migrate_schema(&self, pack: PackId) -> Result<(), RepoError> {
        // Sources are held as-is; there is no host-side schema to upgrade.
        self.store(pack).await.map(|_| ())
    }

    async fn documents(&self, pack: PackId) -> Result<Arc<dyn DocumentRepo>, RepoError> {
        let store: Arc<dyn DocumentRepo> = self.store(pack).await?;
        Ok(store)
    }
}
