use std::sync::Arc;

use serde_json::Value;
use shadowdark_domain::{ActorId, AuthorityRole, SchemaVersion};

use super::{MigrationError, MigrationStep};
use crate::infrastructure::ports::{
    CompendiumPack, CompendiumRepo, DocumentRef, DocumentRepo, Notice, NotificationPort,
};
use crate::use_cases::settings::SettingsOps;

/// Worlds created from a package newer than this skip the historical steps.
pub const BOOTSTRAP_CUTOFF: SchemaVersion = SchemaVersion::from_const(230417.2);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub applied: Vec<SchemaVersion>,
    pub migrated: usize,
    pub failed: usize,
    pub final_version: SchemaVersion,
}

#[derive(Default)]
struct SweepCounts {
    migrated: usize,
    failed: usize,
}

pub struct MigrationRunner {
    settings: Arc<SettingsOps>,
    documents: Arc<dyn DocumentRepo>,
    compendiums: Arc<dyn CompendiumRepo>,
    notifier: Arc<dyn NotificationPort>,
    role: AuthorityRole,
    /// Schema version the installed package ships with.
    package_version: SchemaVersion,
    steps: Vec<Arc<dyn MigrationStep>>,
}

impl MigrationRunner {
    pub fn new(
        settings: Arc<SettingsOps>,
        documents: Arc<dyn DocumentRepo>,
        compendiums: Arc<dyn CompendiumRepo>,
        notifier: Arc<dyn NotificationPort>,
        role: AuthorityRole,
        package_version: SchemaVersion,
    ) -> Self {
        Self {
            settings,
            documents,
            compendiums,
            notifier,
            role,
            package_version,
            steps: Vec::new(),
        }
    }

    pub fn register(&mut self, step: Arc<dyn MigrationStep>) {
        self.steps.push(step);
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = Arc<dyn MigrationStep>>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Newest registered step version.
    pub fn latest_version(&self) -> SchemaVersion {
        self.steps
            .iter()
            .map(|s| s.version())
            .max()
            .unwrap_or(SchemaVersion::UNSET)
    }

    pub async fn needs_migration(&self) -> Result<bool, MigrationError> {
        Ok(self.settings.schema_version().await? < self.latest_version())
    }

    /// Apply every pending step in ascending version order.
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        self.role.require_authority("Migrating world data").map_err(|e| {
            self.notifier
                .notify(Notice::error("Only the game master can migrate world data").permanent());
            e
        })?;

        let current = self.bootstrap().await?;
        let mut pending: Vec<&Arc<dyn MigrationStep>> =
            self.steps.iter().filter(|s| s.version() > current).collect();
        pending.sort_by_key(|s| s.version());

        let mut report = MigrationReport {
            final_version: current,
            ..MigrationReport::default()
        };
        if pending.is_empty() {
            tracing::debug!(version = %current, "World data is up to date");
            return Ok(report);
        }

        tracing::info!(
            from = %current,
            to = %self.latest_version(),
            steps = pending.len(),
            "Beginning world data migration"
        );
        self.notifier.notify(
            Notice::info(format!(
                "Migrating world data to schema version {}. Please be patient and do not close your game.",
                self.latest_version()
            ))
            .permanent(),
        );

        for step in pending {
            let version = step.version();
            tracing::info!(version = %version, "Running migration step");
            self.notifier
                .notify(Notice::info(format!("Running migration {}", version)));

            let counts = self.sweep(step.as_ref()).await?;
            self.settings.set_schema_version(version).await?;

            report.applied.push(version);
            report.migrated += counts.migrated;
            report.failed += counts.failed;
            report.final_version = version;
            tracing::info!(
                version = %version,
                migrated = counts.migrated,
                failed = counts.failed,
                "Migration step completed"
            );
            self.notifier
                .notify(Notice::info(format!("Migration {} completed", version)));
        }

        let summary = if report.failed == 0 {
            Notice::info(format!(
                "World data migrated to schema version {} ({} documents updated)",
                report.final_version, report.migrated
            ))
        } else {
            Notice::warning(format!(
                "World data migrated to schema version {} ({} documents updated, {} failed; see the log)",
                report.final_version, report.migrated, report.failed
            ))
        };
        self.notifier.notify(summary.permanent());
        Ok(report)
    }

    /// Stored schema version, first raising an unset version to the package
    /// version for worlds that never needed the historical steps.
    async fn bootstrap(&self) -> Result<SchemaVersion, MigrationError> {
        let stored = self.settings.schema_version().await?;
        if stored.is_unset() && self.package_version > BOOTSTRAP_CUTOFF {
            tracing::info!(version = %self.package_version, "Initialising schema version for a new world");
            self.settings
                .set_schema_version(self.package_version)
                .await?;
            return Ok(self.package_version);
        }
        Ok(stored)
    }

    /// Settings, then world documents, then world compendium packs.
    async fn sweep(&self, step: &dyn MigrationStep) -> Result<SweepCounts, MigrationError> {
        let mut counts = SweepCounts::default();

        if let Err(e) = step.update_settings(&self.settings).await {
            tracing::error!(version = %step.version(), error = %e, "Failed to migrate settings");
            counts.failed += 1;
        }

        migrate_collection(step, self.documents.as_ref(), None, &mut counts).await?;

        for pack in self.compendiums.list_packs().await? {
            if !pack.is_migratable() {
                continue;
            }
            self.migrate_pack(step, &pack, &mut counts).await?;
        }

        Ok(counts)
    }

    async fn migrate_pack(
        &self,
        step: &dyn MigrationStep,
        pack: &CompendiumPack,
        counts: &mut SweepCounts,
    ) -> Result<(), MigrationError> {
        tracing::debug!(pack = %pack.collection, "Migrating compendium pack");
        self.compendiums.set_locked(pack.id, false).await?;

        let result: Result<(), MigrationError> = async {
            self.compendiums.migrate_schema(pack.id).await?;
            let documents = self.compendiums.documents(pack.id).await?;
            migrate_collection(step, documents.as_ref(), Some(&pack.collection), counts).await
        }
        .await;

        if let Err(e) = self.compendiums.set_locked(pack.id, pack.locked).await {
            tracing::error!(pack = %pack.collection, error = %e, "Failed to restore pack lock");
        }
        result
    }
}

/// Run one step over every actor, every embedded item and every loose item
/// of a collection. Per-document failures are logged and counted.
async fn migrate_collection(
    step: &dyn MigrationStep,
    documents: &dyn DocumentRepo,
    pack: Option<&str>,
    counts: &mut SweepCounts,
) -> Result<(), MigrationError> {
    let pack = pack.unwrap_or("world");
    let version = step.version();

    let mut parents: Vec<(ActorId, Value)> = Vec::new();
    for actor in documents.list_actors().await? {
        let id = actor.id();
        let mut source = actor.source().clone();

        match step.update_actor(&source) {
            Ok(update) if update.is_empty() => {}
            Ok(update) => match documents.update(DocumentRef::Actor(id), &update).await {
                Ok(()) => {
                    update.apply_to(&mut source);
                    counts.migrated += 1;
                    tracing::debug!(actor_id = %id, actor_name = actor.name(), pack, "Migrated actor");
                }
                Err(e) => {
                    tracing::error!(actor_id = %id, actor_name = actor.name(), pack, version = %version, error = %e, "Failed to migrate actor");
                    counts.failed += 1;
                }
            },
            Err(e) => {
                tracing::error!(actor_id = %id, actor_name = actor.name(), pack, version = %version, error = %e, "Failed to migrate actor");
                counts.failed += 1;
            }
        }
        parents.push((id, source));
    }

    for (actor_id, parent) in &parents {
        let items = match documents.list_embedded_items(*actor_id).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(actor_id = %actor_id, pack, error = %e, "Failed to list actor items");
                counts.failed += 1;
                continue;
            }
        };
        for item in items {
            let target = DocumentRef::EmbeddedItem {
                actor: *actor_id,
                item: item.id(),
            };
            migrate_item(step, documents, target, item.name(), item.source(), Some(parent), pack, counts)
                .await;
        }
    }

    for item in documents.list_items().await? {
        let target = DocumentRef::Item(item.id());
        migrate_item(step, documents, target, item.name(), item.source(), None, pack, counts).await;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn migrate_item(
    step: &dyn MigrationStep,
    documents: &dyn DocumentRepo,
    target: DocumentRef,
    name: &str,
    source: &Value,
    owner: Option<&Value>,
    pack: &str,
    counts: &mut SweepCounts,
) {
    let outcome = match step.update_item(source, owner) {
        Ok(update) if update.is_empty() => return,
        Ok(update) => documents
            .update(target, &update)
            .await
            .map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match outcome {
        Ok(()) => {
            counts.migrated += 1;
            tracing::debug!(document = %target, item_name = name, pack, "Migrated item");
        }
        Err(error) => {
            counts.failed += 1;
            tracing::error!(document = %target, item_name = name, pack, version = %step.version(), error, "Failed to migrate item");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use shadowdark_domain::{DomainError, PartialUpdate};

    use super::*;
    use crate::infrastructure::host::{InMemoryCompendiums, InMemoryDocumentStore};
    use crate::infrastructure::ports::{
        MockDocumentRepo, NoticeLevel, PackDocumentKind, PackageType, RepoError, SettingsRepo,
    };
    use crate::test_fixtures::{player, unlit_torch, InMemorySettingsRepo, RecordingNotifier};
    use crate::use_cases::settings::keys;

    /// Tags every actor and item with its version; fails on actors named
    /// "Corrupt". Records the order steps ran in.
    struct TaggingStep {
        version: f64,
        ran: Arc<Mutex<Vec<f64>>>,
    }

    impl TaggingStep {
        fn new(version: f64, ran: &Arc<Mutex<Vec<f64>>>) -> Arc<dyn MigrationStep> {
            Arc::new(Self {
                version,
                ran: ran.clone(),
            })
        }
    }

    #[async_trait]
    impl MigrationStep for TaggingStep {
        fn version(&self) -> SchemaVersion {
            SchemaVersion::from_const(self.version)
        }

        async fn update_settings(&self, _settings: &SettingsOps) -> Result<(), MigrationError> {
            self.ran.lock().expect("order lock").push(self.version);
            Ok(())
        }

        fn update_actor(&self, actor: &Value) -> Result<PartialUpdate, DomainError> {
            if actor["name"] == "Corrupt" {
                return Err(DomainError::validation("unreadable actor data"));
            }
            if actor["flags"]["migrated"] == json!(self.version) {
                return Ok(PartialUpdate::new());
            }
            Ok(PartialUpdate::new().with("flags.migrated", self.version))
        }

        fn update_item(
            &self,
            item: &Value,
            owner: Option<&Value>,
        ) -> Result<PartialUpdate, DomainError> {
            if item["flags"]["migrated"] == json!(self.version) {
                return Ok(PartialUpdate::new());
            }
            let mut update = PartialUpdate::new().with("flags.migrated", self.version);
            if let Some(owner) = owner {
                update.set("flags.ownerMigrated", owner["flags"]["migrated"].clone());
            }
            Ok(update)
        }
    }

    struct Fixture {
        settings: Arc<InMemorySettingsRepo>,
        world: Arc<InMemoryDocumentStore>,
        compendiums: Arc<InMemoryCompendiums>,
        notifier: Arc<RecordingNotifier>,
    }

    impl Fixture {
        fn new(stored_version: Option<f64>) -> Self {
            let mut settings = InMemorySettingsRepo::new();
            if let Some(v) = stored_version {
                settings = settings.with(keys::SCHEMA_VERSION, json!(v));
            }
            Self {
                settings: Arc::new(settings),
                world: Arc::new(InMemoryDocumentStore::new()),
                compendiums: Arc::new(InMemoryCompendiums::new()),
                notifier: Arc::new(RecordingNotifier::new()),
            }
        }

        fn runner(&self, role: AuthorityRole, package_version: f64) -> MigrationRunner {
            MigrationRunner::new(
                Arc::new(SettingsOps::new(self.settings.clone())),
                self.world.clone(),
                self.compendiums.clone(),
                self.notifier.clone(),
                role,
                SchemaVersion::from_const(package_version),
            )
        }

        fn stored_version(&self) -> Option<Value> {
            self.settings.value(keys::SCHEMA_VERSION)
        }
    }

    #[tokio::test]
    async fn steps_run_in_ascending_order() {
        let f = Fixture::new(Some(1.0));
        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([
                TaggingStep::new(30.0, &ran),
                TaggingStep::new(10.0, &ran),
                TaggingStep::new(20.0, &ran),
            ]);

        assert!(runner.needs_migration().await.expect("check"));
        let report = runner.run().await.expect("run");

        assert_eq!(*ran.lock().expect("order lock"), vec![10.0, 20.0, 30.0]);
        assert_eq!(report.final_version, SchemaVersion::from_const(30.0));
        assert_eq!(f.stored_version(), Some(json!(30.0)));
        assert!(!runner.needs_migration().await.expect("check"));
    }

    #[tokio::test]
    async fn new_world_skips_historical_steps() {
        let f = Fixture::new(None);
        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 230500.0)
            .with_steps([
                TaggingStep::new(230417.2, &ran),
                TaggingStep::new(230500.0, &ran),
                TaggingStep::new(230501.0, &ran),
            ]);

        let report = runner.run().await.expect("run");
        assert_eq!(*ran.lock().expect("order lock"), vec![230501.0]);
        assert_eq!(report.applied, vec![SchemaVersion::from_const(230501.0)]);
    }

    #[tokio::test]
    async fn old_package_keeps_historical_steps() {
        let f = Fixture::new(None);
        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 230417.0)
            .with_steps([TaggingStep::new(230417.2, &ran)]);

        runner.run().await.expect("run");
        assert_eq!(*ran.lock().expect("order lock"), vec![230417.2]);
    }

    #[tokio::test]
    async fn up_to_date_world_is_silent() {
        let f = Fixture::new(Some(5.0));
        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([TaggingStep::new(5.0, &ran)]);

        let report = runner.run().await.expect("run");
        assert!(report.applied.is_empty());
        assert!(f.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn one_corrupt_actor_does_not_stop_the_run() {
        let f = Fixture::new(Some(1.0));
        for i in 0..9 {
            f.world.insert_actor(player(&format!("Hero {i}"))).await;
        }
        let corrupt = f.world.insert_actor(player("Corrupt")).await;

        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([TaggingStep::new(2.0, &ran)]);
        let report = runner.run().await.expect("run");

        assert_eq!(report.migrated, 9);
        assert_eq!(report.failed, 1);
        assert_eq!(f.stored_version(), Some(json!(2.0)));
        let untouched = f
            .world
            .source(DocumentRef::Actor(corrupt))
            .await
            .expect("corrupt actor");
        assert!(untouched.get("flags").is_none());
        assert_eq!(f.notifier.count(NoticeLevel::Warning), 1);
    }

    #[tokio::test]
    async fn items_see_the_migrated_parent() {
        let f = Fixture::new(Some(1.0));
        let mut source = player("Kira");
        source["items"] = json!([unlit_torch()]);
        let kira = f.world.insert_actor(source).await;
        let loose = f
            .world
            .insert_item(None, unlit_torch())
            .await
            .expect("loose item");

        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([TaggingStep::new(2.0, &ran)]);
        let report = runner.run().await.expect("run");
        assert_eq!(report.migrated, 3);

        let torch = f.world.list_embedded_items(kira).await.expect("items")[0].id();
        let embedded = f
            .world
            .source(DocumentRef::EmbeddedItem {
                actor: kira,
                item: torch,
            })
            .await
            .expect("torch");
        assert_eq!(embedded["flags"]["ownerMigrated"], json!(2.0));

        let loose = f
            .world
            .source(DocumentRef::Item(loose))
            .await
            .expect("loose");
        assert_eq!(loose["flags"]["migrated"], json!(2.0));
        assert!(loose["flags"].get("ownerMigrated").is_none());
    }

    #[tokio::test]
    async fn documents_failing_validation_are_still_migrated() {
        let f = Fixture::new(Some(1.0));
        let dragon = f
            .world
            .insert_actor(json!({
                "name": "Smaug",
                "type": "Dragon",
                "items": [{"name": "Strange Relic", "type": "Relic", "system": {}}]
            }))
            .await;
        let items = f.world.list_embedded_items(dragon).await.expect("items");
        assert!(!items[0].is_valid());
        let relic = items[0].id();
        assert!(!f.world.list_actors().await.expect("actors")[0].is_valid());

        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([TaggingStep::new(2.0, &ran)]);
        let report = runner.run().await.expect("run");

        assert_eq!(report.migrated, 2);
        assert_eq!(report.failed, 0);
        let actor = f
            .world
            .source(DocumentRef::Actor(dragon))
            .await
            .expect("dragon");
        assert_eq!(actor["flags"]["migrated"], json!(2.0));
        let item = f
            .world
            .source(DocumentRef::EmbeddedItem {
                actor: dragon,
                item: relic,
            })
            .await
            .expect("relic");
        assert_eq!(item["flags"]["migrated"], json!(2.0));
        assert_eq!(item["flags"]["ownerMigrated"], json!(2.0));
    }

    #[tokio::test]
    async fn rerunning_a_step_changes_nothing() {
        let f = Fixture::new(Some(1.0));
        f.world.insert_actor(player("Kira")).await;
        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([TaggingStep::new(2.0, &ran)]);
        assert_eq!(runner.run().await.expect("first run").migrated, 1);

        // Simulate a crash before the version was recorded.
        f.settings
            .set(keys::SCHEMA_VERSION, json!(1.0))
            .await
            .expect("reset");
        assert_eq!(runner.run().await.expect("second run").migrated, 0);
    }

    #[tokio::test]
    async fn world_packs_are_unlocked_migrated_and_relocked() {
        let f = Fixture::new(Some(1.0));
        let (_, monsters) = f
            .compendiums
            .add_pack("world.monsters", PackDocumentKind::Actor, PackageType::World, true)
            .await;
        let mut goblin = player("Goblin");
        goblin["items"] = json!([unlit_torch()]);
        let goblin = monsters.insert_actor(goblin).await;

        let (_, system_pack) = f
            .compendiums
            .add_pack("shadowdark.gear", PackDocumentKind::Item, PackageType::System, true)
            .await;
        let gear = system_pack
            .insert_item(None, unlit_torch())
            .await
            .expect("gear");

        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Authoritative, 0.0)
            .with_steps([TaggingStep::new(2.0, &ran)]);
        let report = runner.run().await.expect("run");

        assert_eq!(report.migrated, 2);
        assert!(monsters.is_locked());
        let migrated = monsters
            .source(DocumentRef::Actor(goblin))
            .await
            .expect("goblin");
        assert_eq!(migrated["flags"]["migrated"], json!(2.0));
        let untouched = system_pack
            .source(DocumentRef::Item(gear))
            .await
            .expect("gear");
        assert!(untouched.get("flags").is_none());
    }

    #[tokio::test]
    async fn listing_failure_leaves_version_unchanged() {
        let f = Fixture::new(Some(1.0));
        let mut documents = MockDocumentRepo::new();
        documents
            .expect_list_actors()
            .returning(|| Err(RepoError::database("list_actors", "store offline")));

        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = MigrationRunner::new(
            Arc::new(SettingsOps::new(f.settings.clone())),
            Arc::new(documents),
            f.compendiums.clone(),
            f.notifier.clone(),
            AuthorityRole::Authoritative,
            SchemaVersion::from_const(0.0),
        )
        .with_steps([TaggingStep::new(2.0, &ran)]);

        assert!(matches!(runner.run().await, Err(MigrationError::Repo(_))));
        assert_eq!(f.stored_version(), Some(json!(1.0)));
    }

    #[tokio::test]
    async fn delegates_cannot_migrate() {
        let f = Fixture::new(Some(1.0));
        let ran = Arc::new(Mutex::new(Vec::new()));
        let runner = f
            .runner(AuthorityRole::Delegate, 0.0)
            .with_steps([TaggingStep::new(2.0, &ran)]);

        let err = runner.run().await.expect_err("refused");
        assert!(err.is_permission_denied());
        assert_eq!(f.notifier.count(NoticeLevel::Error), 1);
        assert!(ran.lock().expect("order lock").is_empty());
    }
}
