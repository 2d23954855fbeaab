//! Repository for the `remote_projects` grant table.

use roster_core::remote::SiteMode;
use roster_core::types::{DbId, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::remote::{RemoteProject, RemoteSite, UpsertRemoteProject};

const COLUMNS: &str = "id, uuid, project_uuid, project_id, site_id, level, date_access";

/// Access grants joining a remote site to a project UUID.
pub struct RemoteProjectRepo;

impl RemoteProjectRepo {
    /// List the grants of a site.
    pub async fn list_for_site(pool: &PgPool, site_id: DbId) -> Result<Vec<RemoteProject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM remote_projects WHERE site_id = $1 ORDER BY id");
        sqlx::query_as::<_, RemoteProject>(&query)
            .bind(site_id)
            .fetch_all(pool)
            .await
    }

    /// Find the grant a site holds for a project UUID.
    pub async fn find(
        pool: &PgPool,
        site_id: DbId,
        project_uuid: Uuid,
    ) -> Result<Option<RemoteProject>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM remote_projects WHERE site_id = $1 AND project_uuid = $2"
        );
        sqlx::query_as::<_, RemoteProject>(&query)
            .bind(site_id)
            .bind(project_uuid)
            .fetch_optional(pool)
            .await
    }

    /// Insert or update the grant for `(site, project_uuid)` and stamp the
    /// access date.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertRemoteProject,
    ) -> Result<RemoteProject, sqlx::Error> {
        let query = format!(
            "INSERT INTO remote_projects (uuid, project_uuid, project_id, site_id, level, date_access)
             VALUES ($1, $2, $3, $4, $5, NOW())
             ON CONFLICT (site_id, project_uuid) DO UPDATE SET
                project_id = COALESCE(EXCLUDED.project_id, remote_projects.project_id),
                level = EXCLUDED.level,
                date_access = EXCLUDED.date_access
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RemoteProject>(&query)
            .bind(Uuid::new_v4())
            .bind(input.project_uuid)
            .bind(input.project_id)
            .bind(input.site_id)
            .bind(input.level.as_str())
            .fetch_one(pool)
            .await
    }

    /// Set the access date of every grant of a site to now.
    pub async fn touch_for_site(pool: &PgPool, site_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE remote_projects SET date_access = NOW() WHERE site_id = $1")
            .bind(site_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Most recent access date among the grants of a site.
    pub async fn last_access(pool: &PgPool, site_id: DbId) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Timestamp>>(
            "SELECT MAX(date_access) FROM remote_projects WHERE site_id = $1",
        )
        .bind(site_id)
        .fetch_one(pool)
        .await
    }

    /// The site in `mode` holding a grant for `project_uuid`, if any.
    pub async fn find_site_for_project(
        pool: &PgPool,
        project_uuid: Uuid,
        mode: SiteMode,
    ) -> Result<Option<RemoteSite>, sqlx::Error> {
        sqlx::query_as::<_, RemoteSite>(
            "SELECT s.id, s.uuid, s.name, s.url, s.mode, s.description, s.secret,
                    s.created_at, s.updated_at
             FROM remote_sites s
             JOIN remote_projects rp ON rp.site_id = s.id
             WHERE rp.project_uuid = $1 AND s.mode = $2
             ORDER BY rp.id
             LIMIT 1",
        )
        .bind(project_uuid)
        .bind(mode.as_str())
        .fetch_optional(pool)
        .await
    }
}
