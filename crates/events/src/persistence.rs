//! Durable timeline persistence.
//!
//! [`TimelinePersistence`] drains the [`EventBus`](crate::bus::EventBus)
//! into the `timeline_events` table until the bus is dropped.

use roster_db::models::timeline::CreateTimelineEvent;
use roster_db::repositories::TimelineEventRepo;
use roster_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::TimelineEvent;

/// Background service that persists timeline events.
pub struct TimelinePersistence;

impl TimelinePersistence {
    /// Run the persistence loop until the channel is closed.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<TimelineEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            event_name = %event.event_name,
                            "Failed to persist timeline event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Timeline persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, timeline persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &TimelineEvent) -> Result<(), sqlx::Error> {
        TimelineEventRepo::insert(pool, &to_row(event)).await?;
        Ok(())
    }
}

fn to_row(event: &TimelineEvent) -> CreateTimelineEvent {
    let objects = event
        .objects
        .iter()
        .map(|o| serde_json::json!({ "label": o.label, "name": o.name }))
        .collect();
    CreateTimelineEvent {
        project_uuid: event.project_uuid,
        app_name: event.app_name.clone(),
        username: event.user.clone(),
        event_name: event.event_name.clone(),
        description: event.description.clone(),
        status_type: event.status_type.clone(),
        objects: serde_json::Value::Array(objects),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_carries_event_fields() {
        let event = TimelineEvent::new(None, "remote_role_delete", "remove {user}")
            .with_object("user", "bob@EXAMPLE");
        let row = to_row(&event);
        assert_eq!(row.event_name, "remote_role_delete");
        assert_eq!(row.app_name, "projectroles");
        assert_eq!(row.objects[0]["name"], "bob@EXAMPLE");
        assert_eq!(row.objects[0]["label"], "user");
    }
}
