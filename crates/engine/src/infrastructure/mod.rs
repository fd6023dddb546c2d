//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod host;
pub mod notifications;
pub mod ports;
pub mod relay;
pub mod settings;
