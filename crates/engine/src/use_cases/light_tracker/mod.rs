//! Light source tracker.
//!
//! Burns down the fuel of every active light carried by player characters.
//! Only the authoritative process runs the timer and writes to documents;
//! delegates forward toggle requests through the message relay.
//!
//! The working set is a [`TrackerSnapshot`] rebuilt from the document store at
//! start, at the beginning of every tick, after any expiry, and whenever a
//! light is toggled or settings change. It is never patched from outside.

use std::sync::Arc;

use shadowdark_domain::{
    remaining_minutes, ActorId, AuthorityRole, BurnOutcome, ClockReading, DocumentEntry,
    DomainError, DurationUnits, ItemId, OwnerSnapshot, PartialUpdate, TimedResource,
    TrackerSnapshot,
};
use shadowdark_shared::{LightTrackerView, LightView, OwnerLightsView, RelayMessage};
use tokio::sync::{watch, Mutex};

use crate::infrastructure::ports::{
    DocumentRef, DocumentRepo, GameClockPort, MessageRelayPort, Notice, NotificationPort,
    RelayError, RepoError, UserRepo,
};
use crate::use_cases::settings::{SettingsError, SettingsOps, TrackerConfig};

const REMAINING_SECS_PATH: &str = "system.light.remainingSecs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Stopped,
    Running,
    Paused,
}

/// Why a tick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRunning,
    Disabled,
    GamePaused,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub updated: usize,
    pub expired: Vec<ItemId>,
    /// Lights whose owner or item vanished between gather and write.
    pub missing: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Skipped(SkipReason),
    Completed(TickReport),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Tracking is switched off in settings.
    Disabled,
    /// Sent to the authoritative process.
    Forwarded,
    Regathered,
}

struct TrackerState {
    status: TrackerStatus,
    config: TrackerConfig,
    snapshot: TrackerSnapshot,
}

pub struct LightSourceTracker {
    documents: Arc<dyn DocumentRepo>,
    users: Arc<dyn UserRepo>,
    settings: Arc<SettingsOps>,
    game_clock: Arc<dyn GameClockPort>,
    relay: Arc<dyn MessageRelayPort>,
    notifier: Arc<dyn NotificationPort>,
    role: AuthorityRole,
    state: Mutex<TrackerState>,
    view: watch::Sender<LightTrackerView>,
}

impl LightSourceTracker {
    pub fn new(
        documents: Arc<dyn DocumentRepo>,
        users: Arc<dyn UserRepo>,
        settings: Arc<SettingsOps>,
        game_clock: Arc<dyn GameClockPort>,
        relay: Arc<dyn MessageRelayPort>,
        notifier: Arc<dyn NotificationPort>,
        role: AuthorityRole,
    ) -> Self {
        let (view, _) = watch::channel(LightTrackerView::default());
        Self {
            documents,
            users,
            settings,
            game_clock,
            relay,
            notifier,
            role,
            state: Mutex::new(TrackerState {
                status: TrackerStatus::Stopped,
                config: TrackerConfig::default(),
                snapshot: TrackerSnapshot::new(),
            }),
            view,
        }
    }

    pub async fn status(&self) -> TrackerStatus {
        self.state.lock().await.status
    }

    pub async fn snapshot(&self) -> TrackerSnapshot {
        self.state.lock().await.snapshot.clone()
    }

    /// Load settings and, on the authoritative process, gather lights and
    /// begin running. Stays stopped when tracking is disabled.
    pub async fn start(&self) -> Result<TrackerStatus, TrackerError> {
        let config = self.settings.tracker_config().await?;
        let mut state = self.state.lock().await;
        state.config = config;

        if !state.config.enabled {
            tracing::info!("Light tracking disabled in settings");
            state.status = TrackerStatus::Stopped;
            return Ok(state.status);
        }
        if !self.role.is_authoritative() {
            tracing::debug!("Light tracking runs on the authoritative process only");
            return Ok(state.status);
        }

        state.snapshot = self.gather(&state.config).await?;
        state.status = TrackerStatus::Running;
        tracing::info!(
            interval_secs = state.config.tick_interval_secs,
            lights = state.snapshot.resource_count(),
            "Light tracker started"
        );
        self.publish(&state);
        Ok(state.status)
    }

    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        state.status = TrackerStatus::Stopped;
        state.snapshot.clear();
        tracing::info!("Light tracker stopped");
        self.publish(&state);
    }

    pub async fn pause(&self) -> TrackerStatus {
        let mut state = self.state.lock().await;
        if state.status == TrackerStatus::Running {
            state.status = TrackerStatus::Paused;
            self.publish(&state);
        }
        state.status
    }

    pub async fn resume(&self) -> TrackerStatus {
        let mut state = self.state.lock().await;
        if state.status == TrackerStatus::Paused {
            state.status = TrackerStatus::Running;
            self.publish(&state);
        }
        state.status
    }

    /// Burn one interval of fuel from every tracked light.
    pub async fn tick(&self) -> Result<TickOutcome, TrackerError> {
        let mut state = self.state.lock().await;

        if state.status != TrackerStatus::Running {
            return Ok(TickOutcome::Skipped(SkipReason::NotRunning));
        }
        if !state.config.enabled {
            return Ok(TickOutcome::Skipped(SkipReason::Disabled));
        }
        if state.config.pause_with_game && self.game_clock.reading().paused {
            tracing::debug!("Game paused, light tick skipped");
            self.publish(&state);
            return Ok(TickOutcome::Skipped(SkipReason::GamePaused));
        }

        tracing::debug!("Performing light tick");
        state.snapshot = self.gather(&state.config).await?;

        let interval = state.config.tick_interval_secs;
        let targets: Vec<(ActorId, ItemId)> = state
            .snapshot
            .resources()
            .map(|r| (r.owner_id, r.id))
            .collect();

        let mut report = TickReport::default();
        for (owner_id, item_id) in targets {
            let Some(resource) = state.snapshot.resource_mut(owner_id, item_id) else {
                continue;
            };
            let Some(outcome) = resource.burn(interval) else {
                continue;
            };
            let target = DocumentRef::EmbeddedItem {
                actor: owner_id,
                item: item_id,
            };

            let result = match outcome {
                BurnOutcome::Exhausted => {
                    tracing::info!(actor_id = %owner_id, item_id = %item_id, "Light source burned out");
                    self.documents.delete(target).await.map(|()| {
                        report.expired.push(item_id);
                    })
                }
                BurnOutcome::Burning { remaining_secs } => self
                    .documents
                    .update(
                        target,
                        &PartialUpdate::new().with(REMAINING_SECS_PATH, remaining_secs),
                    )
                    .await
                    .map(|()| {
                        report.updated += 1;
                    }),
            };

            match result {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    tracing::warn!(actor_id = %owner_id, item_id = %item_id, "Light source vanished during tick");
                    report.missing += 1;
                }
                Err(e) => {
                    tracing::error!(
                        actor_id = %owner_id,
                        item_id = %item_id,
                        error = %e,
                        "Failed to write light source, retrying next tick"
                    );
                    report.failed += 1;
                }
            }
        }

        if !report.expired.is_empty() {
            state.snapshot = self.gather(&state.config).await?;
        }

        self.publish(&state);
        Ok(TickOutcome::Completed(report))
    }

    /// A light was switched on or off on `actor_id`.
    pub async fn toggle(
        &self,
        actor_id: ActorId,
        item_id: ItemId,
    ) -> Result<ToggleOutcome, TrackerError> {
        let config = self.settings.tracker_config().await?;
        if !config.enabled {
            return Ok(ToggleOutcome::Disabled);
        }

        if !self.role.is_authoritative() {
            self.relay
                .send(RelayMessage::ToggleLightSource {
                    actor_id: actor_id.to_uuid(),
                    item_id: item_id.to_uuid(),
                })
                .await?;
            return Ok(ToggleOutcome::Forwarded);
        }

        tracing::debug!(actor_id = %actor_id, item_id = %item_id, "Light toggled, regathering");
        let mut state = self.state.lock().await;
        state.config = config;
        state.snapshot = self.gather(&state.config).await?;
        self.publish(&state);
        Ok(ToggleOutcome::Regathered)
    }

    /// Regather after a change made outside the tracker (dropping or picking
    /// up a light).
    pub async fn refresh(&self) -> Result<(), TrackerError> {
        if !self.role.is_authoritative() {
            return Ok(());
        }
        let mut state = self.state.lock().await;
        if !state.config.enabled {
            return Ok(());
        }
        state.snapshot = self.gather(&state.config).await?;
        self.publish(&state);
        Ok(())
    }

    /// Re-read settings after an external change.
    pub async fn reload_settings(&self) -> Result<TrackerStatus, TrackerError> {
        if !self.role.is_authoritative() {
            return Ok(self.status().await);
        }

        let config = self.settings.tracker_config().await?;
        let mut state = self.state.lock().await;
        state.config = config;

        if state.config.enabled {
            state.snapshot = self.gather(&state.config).await?;
            if state.status == TrackerStatus::Stopped {
                state.status = TrackerStatus::Running;
            }
        } else {
            state.snapshot.clear();
            state.status = TrackerStatus::Stopped;
        }

        tracing::info!(
            enabled = state.config.enabled,
            interval_secs = state.config.tick_interval_secs,
            "Light tracker settings reloaded"
        );
        self.publish(&state);
        Ok(state.status)
    }

    /// Observe the tracker view. Authoritative process only.
    pub fn subscribe(&self) -> Result<watch::Receiver<LightTrackerView>, TrackerError> {
        self.require_authority("Viewing the light tracker")?;
        Ok(self.view.subscribe())
    }

    /// Set a light's remaining fuel directly.
    pub async fn set_light_remaining(
        &self,
        actor_id: ActorId,
        item_id: ItemId,
        remaining_secs: f64,
    ) -> Result<(), TrackerError> {
        self.require_authority("Setting a light's remaining time")?;
        if !(remaining_secs.is_finite() && remaining_secs >= 0.0) {
            return Err(DomainError::validation(format!(
                "remaining time must be a non-negative number of seconds, got {}",
                remaining_secs
            ))
            .into());
        }

        self.documents
            .update(
                DocumentRef::EmbeddedItem {
                    actor: actor_id,
                    item: item_id,
                },
                &PartialUpdate::new().with(REMAINING_SECS_PATH, remaining_secs),
            )
            .await?;
        self.refresh().await
    }

    /// Tick on the configured interval until `shutdown` flips to true.
    ///
    /// A tick in progress always finishes before the loop exits.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("Starting light tracker loop");
        loop {
            let period = self.state.lock().await.config.tick_interval();
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    match self.tick().await {
                        Ok(TickOutcome::Completed(report)) => tracing::debug!(
                            updated = report.updated,
                            expired = report.expired.len(),
                            failed = report.failed,
                            "Light tick complete"
                        ),
                        Ok(TickOutcome::Skipped(_)) => {}
                        Err(e) => tracing::error!(error = %e, "Light tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Light tracker loop stopped");
    }

    fn require_authority(&self, action: &str) -> Result<(), TrackerError> {
        self.role.require_authority(action).map_err(|e| {
            self.notifier
                .notify(Notice::error(format!("{} requires the game master", action)));
            TrackerError::from(e)
        })
    }

    /// Collect every active light carried by eligible users' characters.
    async fn gather(&self, config: &TrackerConfig) -> Result<TrackerSnapshot, TrackerError> {
        let mut snapshot = TrackerSnapshot::new();

        for user in self.users.list_users().await? {
            if user.is_gm || !(user.active || config.monitor_inactive) {
                continue;
            }
            let Some(actor_id) = user.character else {
                continue;
            };

            let actor = match self.documents.get_actor(actor_id).await {
                Ok(Some(actor)) => actor,
                Ok(None) => {
                    tracing::warn!(actor_id = %actor_id, user = %user.name, "Assigned character not found");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(actor_id = %actor_id, error = %e, "Failed to load character");
                    continue;
                }
            };
            let items = match self.documents.list_embedded_items(actor_id).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(actor_id = %actor_id, error = %e, "Failed to list character items");
                    continue;
                }
            };

            let mut owner = OwnerSnapshot::new(actor_id, actor.name());
            for item in items.iter().filter_map(DocumentEntry::valid) {
                if let Some(resource) = TimedResource::from_light_item(actor_id, item) {
                    owner.insert(resource);
                }
            }
            snapshot.insert_owner(owner);
        }

        tracing::debug!(
            owners = snapshot.owners().count(),
            lights = snapshot.resource_count(),
            "Gathered light sources"
        );
        Ok(snapshot)
    }

    fn publish(&self, state: &TrackerState) {
        let paused = state.status == TrackerStatus::Paused
            || (state.config.pause_with_game && self.game_clock.reading().paused);
        self.view.send_replace(build_view(state, paused));
    }
}

fn build_view(state: &TrackerState, paused: bool) -> LightTrackerView {
    let units = DurationUnits::default();
    let clock = ClockReading::default();

    let owners = state
        .snapshot
        .owners()
        .map(|owner| OwnerLightsView {
            actor_id: owner.owner_id.to_uuid(),
            name: owner.owner_name.clone(),
            lights: owner
                .resources
                .values()
                .filter_map(|resource| {
                    let remaining_secs = resource.remaining_secs()?;
                    Some(LightView {
                        item_id: resource.id.to_uuid(),
                        name: resource.name.clone(),
                        remaining_secs,
                        remaining_minutes: remaining_minutes(remaining_secs),
                        progress: resource
                            .evaluate(&clock, &units)
                            .map(|e| e.progress)
                            .unwrap_or(0),
                    })
                })
                .collect(),
        })
        .collect();

    LightTrackerView {
        enabled: state.config.enabled,
        paused,
        owners,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl TrackerError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Domain(DomainError::PermissionDenied(_)))
    }
}
