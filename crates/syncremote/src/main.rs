//! One-shot pull of the registered source site's projects and roles.
//!
//! Meant to be run from cron or by hand on a `TARGET` deployment. Exits
//! non-zero when the pull is refused or fails as a whole.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use roster_core::settings::ProjectRolesSettings;
use roster_db::PgStore;
use roster_events::{EventBus, TimelinePersistence};
use roster_sync::transport::DEFAULT_TIMEOUT;
use roster_sync::{EntityStatus, RemoteClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_syncremote=info,roster_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Remote sync failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    tracing::info!("Synchronizing data from remote site..");

    let settings = ProjectRolesSettings::from_env().context("Invalid PROJECTROLES settings")?;
    let timeout = match std::env::var("REMOTE_SYNC_TIMEOUT_SECS") {
        Ok(value) => Duration::from_secs(
            value
                .trim()
                .parse()
                .context("REMOTE_SYNC_TIMEOUT_SECS must be a number")?,
        ),
        Err(_) => DEFAULT_TIMEOUT,
    };

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = roster_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    roster_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let event_bus = EventBus::default();
    let persistence = tokio::spawn(TimelinePersistence::run(
        pool.clone(),
        event_bus.subscribe(),
    ));

    let store = PgStore::new(pool, settings);
    let client = RemoteClient::new(timeout)?;
    let result = roster_sync::run_remote_sync(&store, &client, Some(&event_bus)).await;

    // Flush pending timeline events before exiting.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), persistence).await;

    let doc = result?;
    let errors = doc
        .projects
        .values()
        .filter(|p| p.status == Some(EntityStatus::Error))
        .count();
    tracing::info!(
        users = doc.users.len(),
        projects = doc.projects.len(),
        errors,
        "Synchronization done",
    );
    Ok(())
}
