//! The tracker's working set: active timed resources grouped by owner.
//!
//! Snapshots are always rebuilt from the document store and never patched.

use std::collections::BTreeMap;

use crate::ids::{ActorId, ItemId};
use crate::timed_resource::TimedResource;

#[derive(Debug, Clone, PartialEq)]
pub struct OwnerSnapshot {
    pub owner_id: ActorId,
    pub owner_name: String,
    pub resources: BTreeMap<ItemId, TimedResource>,
}

impl OwnerSnapshot {
    pub fn new(owner_id: ActorId, owner_name: impl Into<String>) -> Self {
        Self {
            owner_id,
            owner_name: owner_name.into(),
            resources: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, resource: TimedResource) {
        self.resources.insert(resource.id, resource);
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Every owner with at least one active resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerSnapshot {
    owners: BTreeMap<ActorId, OwnerSnapshot>,
}

impl TrackerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an owner; owners without resources are dropped.
    pub fn insert_owner(&mut self, owner: OwnerSnapshot) {
        if owner.is_empty() {
            return;
        }
        self.owners.insert(owner.owner_id, owner);
    }

    pub fn owner(&self, owner_id: ActorId) -> Option<&OwnerSnapshot> {
        self.owners.get(&owner_id)
    }

    pub fn owners(&self) -> impl Iterator<Item = &OwnerSnapshot> {
        self.owners.values()
    }

    pub fn resources(&self) -> impl Iterator<Item = &TimedResource> {
        self.owners.values().flat_map(|o| o.resources.values())
    }

    pub fn resource_mut(
        &mut self,
        owner_id: ActorId,
        item_id: ItemId,
    ) -> Option<&mut TimedResource> {
        self.owners
            .get_mut(&owner_id)
            .and_then(|o| o.resources.get_mut(&item_id))
    }

    pub fn contains(&self, owner_id: ActorId, item_id: ItemId) -> bool {
        self.owners
            .get(&owner_id)
            .is_some_and(|o| o.resources.contains_key(&item_id))
    }

    pub fn resource_count(&self) -> usize {
        self.owners.values().map(|o| o.resources.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn clear(&mut self) {
        self.owners.clear();
    }
}
