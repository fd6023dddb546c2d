//! Shadowdark Shared - types exchanged between the authoritative process and
//! delegates.
//!
//! - Relay messages (delegate → authoritative, best-effort)
//! - Tracker view pushed to observers
//!
//! # Design Principles
//!
//! 1. **No business logic** - pure data types and serialization
//! 2. **No domain IDs** - use raw `uuid::Uuid` in DTOs

pub mod messages;
pub mod views;

pub use messages::{DropPosition, RelayEnvelope, RelayMessage, RELAY_CHANNEL};
pub use views::{LightTrackerView, LightView, OwnerLightsView};
