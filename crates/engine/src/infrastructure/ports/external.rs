//! External collaborator ports: game clock, message relay, notifications.

use async_trait::async_trait;
use shadowdark_domain::ClockReading;
use shadowdark_shared::RelayMessage;

use super::error::RelayError;
use super::types::Notice;

// =============================================================================
// Game Clock
// =============================================================================

/// Read-only view of world time, combat position and the global pause flag.
#[cfg_attr(test, mockall::automock)]
pub trait GameClockPort: Send + Sync {
    fn reading(&self) -> ClockReading;
}

// =============================================================================
// Message Relay
// =============================================================================

/// One-way, best-effort channel from a delegate to the authoritative process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRelayPort: Send + Sync {
    async fn send(&self, message: RelayMessage) -> Result<(), RelayError>;
}

// =============================================================================
// Notifications
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait NotificationPort: Send + Sync {
    fn notify(&self, notice: Notice);
}
