//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the sync engine and
//! the persistence task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{APP_NAME, STATUS_OK};

// ---------------------------------------------------------------------------
// TimelineEvent
// ---------------------------------------------------------------------------

/// An object referenced by an event, e.g. the remote site or the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObject {
    /// Placeholder name used in the description, e.g. `"site"`.
    pub label: String,
    /// Display name of the referenced object.
    pub name: String,
}

/// A logged action on a project.
///
/// Constructed via [`TimelineEvent::new`] and enriched with
/// [`with_user`](TimelineEvent::with_user) and
/// [`with_object`](TimelineEvent::with_object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub project_uuid: Option<Uuid>,
    pub app_name: String,
    /// Username of the acting user, if any.
    pub user: Option<String>,
    pub event_name: String,
    /// Human-readable text; `{label}` placeholders refer to `objects`.
    pub description: String,
    pub status_type: String,
    pub objects: Vec<EventObject>,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEvent {
    /// Create an `OK` event for the project-roles app.
    pub fn new(
        project_uuid: Option<Uuid>,
        event_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            project_uuid,
            app_name: APP_NAME.to_string(),
            user: None,
            event_name: event_name.into(),
            description: description.into(),
            status_type: STATUS_OK.to_string(),
            objects: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_user(mut self, username: Option<&str>) -> Self {
        self.user = username.map(str::to_string);
        self
    }

    /// Attach a labelled object reference.
    pub fn with_object(mut self, label: impl Into<String>, name: impl Into<String>) -> Self {
        self.objects.push(EventObject {
            label: label.into(),
            name: name.into(),
        });
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
pub struct EventBus {
    sender: broadcast::Sender<TimelineEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With no active subscribers the event is dropped.
    pub fn publish(&self, event: TimelineEvent) {
        // SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimelineEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
