//! Stored timeline events.

use roster_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `timeline_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredTimelineEvent {
    pub id: DbId,
    pub project_uuid: Option<Uuid>,
    pub app_name: String,
    pub username: Option<String>,
    pub event_name: String,
    pub description: String,
    pub status_type: String,
    pub objects: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for appending a timeline event.
#[derive(Debug, Clone)]
pub struct CreateTimelineEvent {
    pub project_uuid: Option<Uuid>,
    pub app_name: String,
    pub username: Option<String>,
    pub event_name: String,
    pub description: String,
    pub status_type: String,
    pub objects: serde_json::Value,
}
