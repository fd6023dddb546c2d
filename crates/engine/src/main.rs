//! Shadowdark engine - Main entry point.
//!
//! Seeds the in-memory host stand-in from a world file, brings the world's
//! data up to the current schema, then runs the light tracker and the relay
//! dispatcher until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use shadowdark_domain::{AuthorityRole, ClockReading, SchemaVersion};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shadowdark_engine::app::{App, HostServices, Repositories};
use shadowdark_engine::infrastructure::{
    clock::{SharedGameClock, SystemClock},
    host::{InMemoryCompendiums, InMemoryDocumentStore, InMemoryUsers, WorldFixture},
    notifications::TracingNotifier,
    ports::ClockPort,
    relay::{ChannelRelay, DEFAULT_RELAY_CAPACITY},
    settings::SqliteSettingsRepo,
};

/// Schema version of the data this build ships with.
const PACKAGE_SCHEMA_VERSION: f64 = 230612.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shadowdark_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Shadowdark engine");

    // Load configuration
    let settings_db =
        std::env::var("SHADOWDARK_SETTINGS_DB").unwrap_or_else(|_| "shadowdark-settings.db".into());
    let world_file = std::env::var("SHADOWDARK_WORLD_FILE").ok();
    let role: AuthorityRole = std::env::var("SHADOWDARK_ROLE")
        .unwrap_or_else(|_| "authoritative".into())
        .parse()
        .context("SHADOWDARK_ROLE")?;
    let package_version = match std::env::var("SHADOWDARK_SYSTEM_SCHEMA_VERSION") {
        Ok(raw) => SchemaVersion::new(
            raw.trim()
                .parse()
                .with_context(|| format!("SHADOWDARK_SYSTEM_SCHEMA_VERSION is not a number: {raw}"))?,
        )?,
        Err(_) => SchemaVersion::from_const(PACKAGE_SCHEMA_VERSION),
    };
    tracing::info!(role = ?role, package_version = %package_version, "Configuration loaded");

    // Host stand-in
    let documents = Arc::new(InMemoryDocumentStore::new());
    let compendiums = Arc::new(InMemoryCompendiums::new());
    let users = Arc::new(InMemoryUsers::new());
    let mut clock_reading = ClockReading::default();
    if let Some(path) = world_file {
        tracing::info!(path = %path, "Seeding world");
        let fixture = WorldFixture::load(&path).await?;
        fixture.seed(&documents, &compendiums, &users).await?;
        clock_reading = fixture.clock_reading();
    } else {
        tracing::warn!("SHADOWDARK_WORLD_FILE not set, starting with an empty world");
    }
    let game_clock = Arc::new(SharedGameClock::new(clock_reading));

    let wall_clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let settings = Arc::new(SqliteSettingsRepo::new(&settings_db, wall_clock).await?);
    let (relay, inbox) = ChannelRelay::channel(DEFAULT_RELAY_CAPACITY);

    let app = App::new(
        Repositories {
            documents,
            compendiums,
            users,
            settings,
        },
        HostServices {
            game_clock,
            relay: Arc::new(relay),
            notifier: Arc::new(TracingNotifier::new()),
        },
        role,
        package_version,
    );

    if role.is_authoritative() {
        match app.use_cases.migration.run().await {
            Ok(report) => tracing::info!(
                version = %report.final_version,
                applied = report.applied.len(),
                migrated = report.migrated,
                failed = report.failed,
                "World data is current"
            ),
            Err(e) => tracing::error!(error = %e, "Migration did not complete, will retry next launch"),
        }
    }

    let status = app.use_cases.light_tracker.start().await?;
    tracing::info!(status = ?status, "Light tracker ready");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let tracker_task = tokio::spawn(
        app.use_cases
            .light_tracker
            .clone()
            .run(shutdown_rx.clone()),
    );
    let relay_task = tokio::spawn(
        app.use_cases
            .relay_dispatch
            .clone()
            .run(inbox, shutdown_rx),
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);

    tracker_task.await?;
    relay_task.await?;
    app.use_cases.light_tracker.stop().await;
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
