//! Remote project synchronization.
//!
//! A `SOURCE` deployment serves each registered `TARGET` a [`SyncDocument`]
//! built by [`RemoteProjectApi::get_target_data`]; the target fetches it
//! through [`RemoteClient`] and applies it with
//! [`RemoteProjectApi::sync_source_data`].

pub mod builder;
pub mod command;
pub mod document;
pub mod error;
pub mod fields;
pub mod reconcile;
pub mod transport;

use roster_db::ProjectRoleStore;
use roster_events::EventBus;

pub use command::{ensure_sync_enabled, run_remote_sync, sync_from_site};
pub use document::{EntityStatus, ProjectEntry, RoleEntry, SyncDocument, UserEntry};
pub use error::SyncError;
pub use transport::{RemoteClient, TransportError};

/// Entry points of the sync protocol, bound to a store and an optional
/// event log.
#[derive(Clone, Copy)]
pub struct RemoteProjectApi<'a> {
    store: &'a dyn ProjectRoleStore,
    events: Option<&'a EventBus>,
}

impl<'a> RemoteProjectApi<'a> {
    pub fn new(store: &'a dyn ProjectRoleStore) -> Self {
        Self {
            store,
            events: None,
        }
    }

    /// Publish a timeline event for every mutating reconciler action.
    pub fn with_events(mut self, events: &'a EventBus) -> Self {
        self.events = Some(events);
        self
    }
}
