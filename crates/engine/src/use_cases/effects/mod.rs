//! Effect use cases.
//!
//! Handles timed effects carried by actors:
//! - Stamping an effect's start time and combat position at creation
//! - Deleting effects whose duration has run out

mod create_effect;
mod expire_effects;

use std::sync::Arc;

pub use create_effect::EffectOps;
pub use expire_effects::{ExpireEffects, ExpiryReport};

use shadowdark_domain::DomainError;

use crate::infrastructure::ports::RepoError;

/// Container for effect use cases.
pub struct EffectUseCases {
    pub ops: Arc<EffectOps>,
    pub expire: Arc<ExpireEffects>,
}

impl EffectUseCases {
    pub fn new(ops: Arc<EffectOps>, expire: Arc<ExpireEffects>) -> Self {
        Self { ops, expire }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Rounds-based effects can only be created during combat")]
    RequiresCombat,
    #[error(transparent)]
    Domain(#[from] DomainError),
}
