//! Repository for the `role_assignments` table.

use roster_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::role::{
    CreateRoleAssignment, RoleAssignment, RoleAssignmentDetail, UpdateRoleAssignment,
};

const COLUMNS: &str = "id, uuid, project_id, user_id, role_id, created_at, updated_at";

/// Columns of [`RoleAssignmentDetail`], qualified for the user/role join.
const DETAIL_COLUMNS: &str = "ra.id, ra.uuid, ra.project_id, ra.user_id, u.username, \
                              ra.role_id, r.name AS role_name";

const DETAIL_FROM: &str = "role_assignments ra
     JOIN users u ON u.id = ra.user_id
     JOIN roles r ON r.id = ra.role_id";

/// Provides CRUD operations for role assignments.
pub struct RoleAssignmentRepo;

impl RoleAssignmentRepo {
    /// Insert a new assignment, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRoleAssignment,
    ) -> Result<RoleAssignment, sqlx::Error> {
        let query = format!(
            "INSERT INTO role_assignments (uuid, project_id, user_id, role_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RoleAssignment>(&query)
            .bind(input.uuid.unwrap_or_else(Uuid::new_v4))
            .bind(input.project_id)
            .bind(input.user_id)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    /// All assignments of a project with username and role name.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<RoleAssignmentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM {DETAIL_FROM}
             WHERE ra.project_id = $1
             ORDER BY ra.id"
        );
        sqlx::query_as::<_, RoleAssignmentDetail>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find the assignment of a user on a project, with names joined.
    pub async fn find_by_project_and_user(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<RoleAssignmentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {DETAIL_COLUMNS} FROM {DETAIL_FROM}
             WHERE ra.project_id = $1 AND ra.user_id = $2"
        );
        sqlx::query_as::<_, RoleAssignmentDetail>(&query)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an assignment by its internal ID, with names joined.
    pub async fn find_detail_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<RoleAssignmentDetail>, sqlx::Error> {
        let query = format!("SELECT {DETAIL_COLUMNS} FROM {DETAIL_FROM} WHERE ra.id = $1");
        sqlx::query_as::<_, RoleAssignmentDetail>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Reassign the user and role. Returns `None` if the row does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRoleAssignment,
    ) -> Result<Option<RoleAssignment>, sqlx::Error> {
        let query = format!(
            "UPDATE role_assignments SET user_id = $2, role_id = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RoleAssignment>(&query)
            .bind(id)
            .bind(input.user_id)
            .bind(input.role_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete an assignment by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM role_assignments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
