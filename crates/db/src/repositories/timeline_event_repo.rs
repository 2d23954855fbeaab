//! Repository for the append-only `timeline_events` table.

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::timeline::{CreateTimelineEvent, StoredTimelineEvent};

const COLUMNS: &str = "id, project_uuid, app_name, username, event_name, description, \
                       status_type, objects, created_at";

pub struct TimelineEventRepo;

impl TimelineEventRepo {
    /// Insert a timeline event, returning the stored row.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateTimelineEvent,
    ) -> Result<StoredTimelineEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO timeline_events
                (project_uuid, app_name, username, event_name, description, status_type, objects)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoredTimelineEvent>(&query)
            .bind(input.project_uuid)
            .bind(&input.app_name)
            .bind(&input.username)
            .bind(&input.event_name)
            .bind(&input.description)
            .bind(&input.status_type)
            .bind(&input.objects)
            .fetch_one(pool)
            .await
    }

    /// Events of one project, newest first.
    pub async fn list_for_project(
        pool: &PgPool,
        project_uuid: Uuid,
        limit: i64,
    ) -> Result<Vec<StoredTimelineEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM timeline_events
             WHERE project_uuid = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, StoredTimelineEvent>(&query)
            .bind(project_uuid)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
