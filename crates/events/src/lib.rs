//! Timeline event log for remote sync actions.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TimelineEvent`]: one logged action with its labelled objects.
//! - [`TimelinePersistence`]: background task writing every event to the
//!   `timeline_events` table.

pub mod bus;
pub mod persistence;

pub use bus::{EventBus, EventObject, TimelineEvent};
pub use persistence::TimelinePersistence;

/// App name recorded on every event raised by project/role management.
pub const APP_NAME: &str = "projectroles";

/// Status recorded for actions that completed.
pub const STATUS_OK: &str = "OK";

pub const EVENT_REMOTE_PROJECT_CREATE: &str = "remote_project_create";
pub const EVENT_REMOTE_PROJECT_UPDATE: &str = "remote_project_update";
pub const EVENT_REMOTE_ROLE_CREATE: &str = "remote_role_create";
pub const EVENT_REMOTE_ROLE_UPDATE: &str = "remote_role_update";
pub const EVENT_REMOTE_ROLE_DELETE: &str = "remote_role_delete";
