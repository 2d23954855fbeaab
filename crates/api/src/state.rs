use std::sync::Arc;

use roster_db::ProjectRoleStore;
use roster_events::EventBus;
use roster_sync::RemoteClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already shares its inner
/// connection pool.
#[derive(Clone)]
pub struct AppState {
    /// Project, role and remote-site persistence.
    pub store: Arc<dyn ProjectRoleStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Timeline events published by sync runs.
    pub event_bus: Arc<EventBus>,
    /// HTTP client for peer sites.
    pub remote_client: RemoteClient,
}
