//! In-memory stand-in for the host platform: document store, compendium
//! packs, user directory, and the JSON world fixture that seeds them.

mod compendiums;
mod documents;
mod users;
mod world_file;

pub use compendiums::InMemoryCompendiums;
pub use documents::InMemoryDocumentStore;
pub use users::InMemoryUsers;
pub use world_file::{ClockFixture, PackFixture, UserFixture, WorldFixture};
