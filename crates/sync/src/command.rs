//! Target-side pull of a source site's document.

use roster_core::remote::SiteMode;
use roster_core::settings::ProjectRolesSettings;
use roster_db::models::remote::RemoteSite;
use roster_db::ProjectRoleStore;
use roster_events::EventBus;

use crate::document::SyncDocument;
use crate::error::SyncError;
use crate::transport::{RemoteClient, TransportError};
use crate::RemoteProjectApi;

/// Refuse to pull unless this deployment is a `TARGET` with categories on.
pub fn ensure_sync_enabled(settings: &ProjectRolesSettings) -> Result<(), SyncError> {
    if settings.disable_categories {
        let err = SyncError::CategoriesDisabled;
        tracing::info!("{err}");
        return Err(err);
    }
    if settings.site_mode != SiteMode::Target {
        let err = SyncError::NotTargetMode;
        tracing::error!("{err}");
        return Err(err);
    }
    Ok(())
}

/// Fetch the document the configured source site serves for this
/// deployment and apply it.
pub async fn run_remote_sync(
    store: &dyn ProjectRoleStore,
    client: &RemoteClient,
    events: Option<&EventBus>,
) -> Result<SyncDocument, SyncError> {
    ensure_sync_enabled(store.settings())?;

    let Some(site) = store.find_source_site().await? else {
        let err = SyncError::NoSourceSite;
        tracing::error!("{err}");
        return Err(err);
    };

    sync_from_site(store, client, events, &site).await
}

/// Fetch and apply the document served by `site`, which must be a
/// `SOURCE` site.
pub async fn sync_from_site(
    store: &dyn ProjectRoleStore,
    client: &RemoteClient,
    events: Option<&EventBus>,
    site: &RemoteSite,
) -> Result<SyncDocument, SyncError> {
    let settings = store.settings();
    ensure_sync_enabled(settings)?;

    if site.mode != SiteMode::Source {
        return Err(SyncError::NotSourceSite(site.name.clone()));
    }

    if settings.allow_local_users {
        tracing::info!("PROJECTROLES_ALLOW_LOCAL_USERS=True, will sync roles for existing local users");
    }

    tracing::info!(site = %site.name, url = %site.url, "Retrieving data from remote site");
    let doc = client.fetch_document(site).await.map_err(|e| {
        tracing::error!(site = %site.name, error = %e, "Unable to retrieve data from remote site");
        match e {
            TransportError::Decode(msg) => SyncError::InvalidDocument(msg),
            other => SyncError::Transport(other),
        }
    })?;

    let mut api = RemoteProjectApi::new(store);
    if let Some(bus) = events {
        api = api.with_events(bus);
    }
    let doc = api.sync_source_data(site, doc, None).await?;

    tracing::info!(site = %site.name, "Sync OK");
    Ok(doc)
}
