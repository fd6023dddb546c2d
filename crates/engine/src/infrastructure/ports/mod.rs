//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The host document store and compendium packs (owned by the host)
//! - Users and settings
//! - The message relay and user notifications
//! - Game clock and wall clock (for testing)

mod error;
mod external;
mod repos;
mod testing;
pub mod types;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{CompendiumRepo, DocumentRepo, SettingsRepo, UserRepo};

// =============================================================================
// Types from types module (re-export for visibility)
// =============================================================================
pub use types::{
    CompendiumPack, DocumentRef, Notice, NoticeLevel, PackDocumentKind, PackageType, UserRecord,
};

// =============================================================================
// External Collaborator Ports
// =============================================================================
pub use external::{GameClockPort, MessageRelayPort, NotificationPort};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockCompendiumRepo, MockDocumentRepo, MockSettingsRepo, MockUserRepo};

#[cfg(test)]
pub use external::{MockGameClockPort, MockMessageRelayPort, MockNotificationPort};

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{RelayError, RepoError};
