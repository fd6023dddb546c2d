//! Shadowdark engine library.
//!
//! Timed-resource bookkeeping and data migrations for the Shadowdark rules
//! system, written against ports so the host platform can be swapped out.
//!
//! ## Structure
//!
//! - `use_cases/` - Light tracking, effects, scene lights, migrations, relay dispatch
//! - `infrastructure/` - Port traits and their adapters
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Shared fixtures for use case tests.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
