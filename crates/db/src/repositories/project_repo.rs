//! Repository for the `projects` table.

use roster_core::project::SUBMIT_STATUS_OK;
use roster_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, UpdateProject};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, uuid, title, type, parent_id, description, readme, \
                       submit_status, created_at, updated_at";

/// Provides CRUD and tree lookups for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// A fresh UUID is generated when `input.uuid` is `None`.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (uuid, title, type, parent_id, description, readme, submit_status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.uuid.unwrap_or_else(Uuid::new_v4))
            .bind(&input.title)
            .bind(input.project_type.as_str())
            .bind(input.parent_id)
            .bind(&input.description)
            .bind(&input.readme)
            .bind(SUBMIT_STATUS_OK)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by its UUID.
    pub async fn find_by_uuid(pool: &PgPool, uuid: Uuid) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE uuid = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(uuid)
            .fetch_optional(pool)
            .await
    }

    /// Find the sibling with `title` under `parent_id` (`None` for the root).
    pub async fn find_by_parent_and_title(
        pool: &PgPool,
        parent_id: Option<DbId>,
        title: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE parent_id IS NOT DISTINCT FROM $1 AND title = $2"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(parent_id)
            .bind(title)
            .fetch_optional(pool)
            .await
    }

    /// Direct children with a completed submission, ordered by title.
    pub async fn list_children(pool: &PgPool, parent_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE parent_id = $1 AND submit_status = $2
             ORDER BY title"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(parent_id)
            .bind(SUBMIT_STATUS_OK)
            .fetch_all(pool)
            .await
    }

    /// Update a project. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                readme = COALESCE($4, readme),
                parent_id = CASE WHEN $5 THEN $6 ELSE parent_id END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.readme)
            .bind(input.parent_id.is_some())
            .bind(input.parent_id.flatten())
            .fetch_optional(pool)
            .await
    }
}
