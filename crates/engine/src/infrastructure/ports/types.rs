//! Plain data types carried across the port boundary.

use serde::{Deserialize, Serialize};
use shadowdark_domain::{ActorId, ItemId, PackId, UserId};

// =============================================================================
// Document Addressing
// =============================================================================

/// A document the store can update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentRef {
    Actor(ActorId),
    /// A world-level item, not owned by an actor.
    Item(ItemId),
    /// An item embedded in an actor.
    EmbeddedItem { actor: ActorId, item: ItemId },
}

impl DocumentRef {
    pub fn item(owner: Option<ActorId>, item: ItemId) -> Self {
        match owner {
            Some(actor) => DocumentRef::EmbeddedItem { actor, item },
            None => DocumentRef::Item(item),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DocumentRef::Actor(_) => "Actor",
            DocumentRef::Item(_) | DocumentRef::EmbeddedItem { .. } => "Item",
        }
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRef::Actor(id) => write!(f, "Actor.{}", id),
            DocumentRef::Item(id) => write!(f, "Item.{}", id),
            DocumentRef::EmbeddedItem { actor, item } => {
                write!(f, "Actor.{}.Item.{}", actor, item)
            }
        }
    }
}

// =============================================================================
// Compendium Types
// =============================================================================

/// Document class stored in a compendium pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackDocumentKind {
    Actor,
    Item,
    #[serde(other)]
    Other,
}

/// Package a compendium pack belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    World,
    System,
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompendiumPack {
    pub id: PackId,
    /// Host collection name, e.g. `world.monsters`.
    pub collection: String,
    pub document_kind: PackDocumentKind,
    pub package_type: PackageType,
    pub locked: bool,
}

impl CompendiumPack {
    /// World-owned Actor or Item packs are the only ones data migrations touch.
    pub fn is_migratable(&self) -> bool {
        self.package_type == PackageType::World
            && matches!(
                self.document_kind,
                PackDocumentKind::Actor | PackDocumentKind::Item
            )
    }
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub is_gm: bool,
    pub active: bool,
    /// The character this user plays, if assigned.
    pub character: Option<ActorId>,
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Stays on screen until dismissed.
    pub permanent: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
            permanent: false,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
            permanent: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            permanent: false,
        }
    }

    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }
}
