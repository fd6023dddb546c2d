use std::sync::Arc;

use shadowdark_domain::{
    AuthorityRole, DocumentEntry, DurationUnits, HostDocument, ItemId, TimedResource,
};

use super::EffectError;
use crate::infrastructure::ports::{
    DocumentRef, DocumentRepo, GameClockPort, Notice, NotificationPort,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpiryReport {
    pub expired: Vec<ItemId>,
    /// Round effects evaluated on the round and turn they were created.
    pub undetermined: usize,
    pub failed: usize,
}

/// Deletes effects whose duration has run out.
pub struct ExpireEffects {
    documents: Arc<dyn DocumentRepo>,
    game_clock: Arc<dyn GameClockPort>,
    notifier: Arc<dyn NotificationPort>,
    units: DurationUnits,
    role: AuthorityRole,
}

impl ExpireEffects {
    pub fn new(
        documents: Arc<dyn DocumentRepo>,
        game_clock: Arc<dyn GameClockPort>,
        notifier: Arc<dyn NotificationPort>,
        units: DurationUnits,
        role: AuthorityRole,
    ) -> Self {
        Self {
            documents,
            game_clock,
            notifier,
            units,
            role,
        }
    }

    /// Evaluate every effect on every actor against the current clock and
    /// delete the expired ones.
    pub async fn execute(&self) -> Result<ExpiryReport, EffectError> {
        self.role.require_authority("Expiring effects").map_err(|e| {
            self.notifier
                .notify(Notice::error("Only the game master can expire effects"));
            e
        })?;

        let clock = self.game_clock.reading();
        let mut report = ExpiryReport::default();

        for actor in self.documents.list_actors().await? {
            let actor_id = actor.id();
            let items = match self.documents.list_embedded_items(actor_id).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(actor_id = %actor_id, error = %e, "Failed to list actor items");
                    continue;
                }
            };

            for item in items.iter().filter_map(DocumentEntry::valid) {
                let Some(resource) = TimedResource::from_effect_item(actor_id, item) else {
                    continue;
                };
                let Some(evaluation) = resource.evaluate(&clock, &self.units) else {
                    report.undetermined += 1;
                    continue;
                };
                if !evaluation.expired {
                    continue;
                }

                let target = DocumentRef::EmbeddedItem {
                    actor: actor_id,
                    item: item.id(),
                };
                match self.documents.delete(target).await {
                    Ok(()) => {
                        tracing::info!(actor_id = %actor_id, item_id = %item.id(), effect = %item.name(), "Effect expired");
                        report.expired.push(item.id());
                    }
                    Err(e) if e.is_not_found() => {}
                    Err(e) => {
                        tracing::error!(actor_id = %actor_id, item_id = %item.id(), error = %e, "Failed to delete expired effect");
                        report.failed += 1;
                    }
                }
            }
        }

        Ok(report)
    }
}
