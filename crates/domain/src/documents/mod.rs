//! Host documents as seen by this crate.
//!
//! The host owns the document store. Documents arrive as their raw JSON
//! source (the shape the host persists) and are wrapped in typed views that
//! validate the fields this crate relies on. Documents that fail validation
//! are still surfaced, as [`RawDocument`]s, so batch operations can process or
//! report them instead of silently skipping them.

mod actor;
mod item;

pub use actor::{ActorDocument, ActorType};
pub use item::{
    remaining_minutes, EffectStart, ItemDocument, ItemType, LightData, DEFAULT_LIGHT_LONGEVITY_MINS,
};

use serde_json::Value;

use crate::error::DomainError;

/// Common surface of typed host documents.
pub trait HostDocument {
    type Id: Copy + std::fmt::Display;

    /// Host document class name ("Actor", "Item").
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
    fn name(&self) -> &str;
    fn source(&self) -> &Value;
}

/// Best-effort view of a document that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument<I> {
    pub id: I,
    pub name: String,
    pub source: Value,
}

impl<I> RawDocument<I> {
    pub fn new(id: I, source: Value) -> Self {
        let name = source
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("(unnamed)")
            .to_string();
        Self { id, name, source }
    }
}

/// A listed document: either valid, or the raw fallback for an invalid one.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEntry<D: HostDocument> {
    Valid(D),
    Invalid(RawDocument<D::Id>),
}

impl<D: HostDocument> DocumentEntry<D> {
    pub fn id(&self) -> D::Id {
        match self {
            DocumentEntry::Valid(doc) => doc.id(),
            DocumentEntry::Invalid(raw) => raw.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DocumentEntry::Valid(doc) => doc.name(),
            DocumentEntry::Invalid(raw) => &raw.name,
        }
    }

    pub fn source(&self) -> &Value {
        match self {
            DocumentEntry::Valid(doc) => doc.source(),
            DocumentEntry::Invalid(raw) => &raw.source,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DocumentEntry::Valid(_))
    }

    pub fn valid(&self) -> Option<&D> {
        match self {
            DocumentEntry::Valid(doc) => Some(doc),
            DocumentEntry::Invalid(_) => None,
        }
    }
}

/// Read and validate the `name` field shared by every document.
pub(crate) fn required_name(source: &Value, kind: &str) -> Result<String, DomainError> {
    source
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DomainError::validation(format!("{} document has no name", kind)))
}

/// Read and parse the `_id` field.
pub(crate) fn required_id<I>(source: &Value, kind: &str) -> Result<I, DomainError>
where
    I: std::str::FromStr<Err = DomainError>,
{
    source
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| DomainError::validation(format!("{} document has no _id", kind)))?
        .parse()
}
