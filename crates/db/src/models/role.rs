//! Role and role assignment models.

use roster_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `roles` lookup table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Role {
    pub id: DbId,
    pub name: String,
    pub description: String,
}

/// A row from the `role_assignments` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RoleAssignment {
    pub id: DbId,
    pub uuid: Uuid,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A role assignment joined with its username and role name.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RoleAssignmentDetail {
    pub id: DbId,
    pub uuid: Uuid,
    pub project_id: DbId,
    pub user_id: DbId,
    pub username: String,
    pub role_id: DbId,
    pub role_name: String,
}

/// DTO for creating a role assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleAssignment {
    pub uuid: Option<Uuid>,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role_id: DbId,
}

/// DTO for reassigning the user or role of an assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleAssignment {
    pub user_id: DbId,
    pub role_id: DbId,
}
