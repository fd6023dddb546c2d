//! Application state and composition.

use std::sync::Arc;

use shadowdark_domain::{AuthorityRole, DurationUnits, SchemaVersion};

use crate::infrastructure::ports::{
    CompendiumRepo, DocumentRepo, GameClockPort, MessageRelayPort, NotificationPort, SettingsRepo,
    UserRepo,
};
use crate::use_cases;
use crate::use_cases::migration::builtin_steps;

/// Main application state.
///
/// Holds the host ports and every use case wired against them.
pub struct App {
    pub role: AuthorityRole,
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for the host stores.
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepo>,
    pub compendiums: Arc<dyn CompendiumRepo>,
    pub users: Arc<dyn UserRepo>,
    pub settings: Arc<dyn SettingsRepo>,
}

/// Container for all use cases.
pub struct UseCases {
    pub settings: Arc<use_cases::SettingsOps>,
    pub light_tracker: Arc<use_cases::LightSourceTracker>,
    pub scene_light: Arc<use_cases::LightSceneOps>,
    pub effects: use_cases::EffectUseCases,
    pub migration: Arc<use_cases::MigrationRunner>,
    pub relay_dispatch: Arc<use_cases::RelayDispatcher>,
}

/// Collaborators the host provides besides its stores.
pub struct HostServices {
    pub game_clock: Arc<dyn GameClockPort>,
    pub relay: Arc<dyn MessageRelayPort>,
    pub notifier: Arc<dyn NotificationPort>,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        repositories: Repositories,
        services: HostServices,
        role: AuthorityRole,
        package_version: SchemaVersion,
    ) -> Self {
        let HostServices {
            game_clock,
            relay,
            notifier,
        } = services;

        let settings = Arc::new(use_cases::SettingsOps::new(repositories.settings.clone()));

        let light_tracker = Arc::new(use_cases::LightSourceTracker::new(
            repositories.documents.clone(),
            repositories.users.clone(),
            settings.clone(),
            game_clock.clone(),
            relay.clone(),
            notifier.clone(),
            role,
        ));

        let scene_light = Arc::new(use_cases::LightSceneOps::new(
            repositories.documents.clone(),
            light_tracker.clone(),
            relay.clone(),
            role,
        ));

        let effects = use_cases::EffectUseCases::new(
            Arc::new(use_cases::EffectOps::new(
                repositories.documents.clone(),
                game_clock.clone(),
                notifier.clone(),
            )),
            Arc::new(use_cases::ExpireEffects::new(
                repositories.documents.clone(),
                game_clock,
                notifier.clone(),
                DurationUnits::default(),
                role,
            )),
        );

        let migration = Arc::new(
            use_cases::MigrationRunner::new(
                settings.clone(),
                repositories.documents.clone(),
                repositories.compendiums.clone(),
                notifier,
                role,
                package_version,
            )
            .with_steps(builtin_steps()),
        );

        let relay_dispatch = Arc::new(use_cases::RelayDispatcher::new(
            light_tracker.clone(),
            scene_light.clone(),
            role,
        ));

        Self {
            role,
            repositories,
            use_cases: UseCases {
                settings,
                light_tracker,
                scene_light,
                effects,
                migration,
                relay_dispatch,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SharedGameClock;
    use crate::infrastructure::host::{InMemoryCompendiums, InMemoryDocumentStore, InMemoryUsers};
    use crate::infrastructure::relay::ChannelRelay;
    use crate::test_fixtures::{InMemorySettingsRepo, RecordingNotifier};
    use shadowdark_domain::ClockReading;

    #[tokio::test]
    async fn new_world_needs_no_migration_at_current_package_version() {
        let (relay, _inbox) = ChannelRelay::channel(4);
        let app = App::new(
            Repositories {
                documents: Arc::new(InMemoryDocumentStore::new()),
                compendiums: Arc::new(InMemoryCompendiums::new()),
                users: Arc::new(InMemoryUsers::new()),
                settings: Arc::new(InMemorySettingsRepo::new()),
            },
            HostServices {
                game_clock: Arc::new(SharedGameClock::new(ClockReading::at(0.0))),
                relay: Arc::new(relay),
                notifier: Arc::new(RecordingNotifier::new()),
            },
            AuthorityRole::Authoritative,
            SchemaVersion::from_const(230612.0),
        );

        let report = app.use_cases.migration.run().await.expect("migrate");
        assert!(report.applied.is_empty());
        assert_eq!(report.final_version, SchemaVersion::from_const(230612.0));
        assert!(!app
            .use_cases
            .migration
            .needs_migration()
            .await
            .expect("check"));
    }
}
