//! Project entity model and DTOs.

use roster_core::project::{ProjectType, SUBMIT_STATUS_OK};
use roster_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A project row from the `projects` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub uuid: Uuid,
    pub title: String,
    #[sqlx(rename = "type", try_from = "String")]
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub parent_id: Option<DbId>,
    pub description: Option<String>,
    pub readme: String,
    pub submit_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn is_category(&self) -> bool {
        self.project_type == ProjectType::Category
    }

    /// Whether creation has completed.
    pub fn is_submitted(&self) -> bool {
        self.submit_status == SUBMIT_STATUS_OK
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    /// Preserved when mirroring a project from another site.
    pub uuid: Option<Uuid>,
    pub title: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub parent_id: Option<DbId>,
    pub description: Option<String>,
    #[serde(default)]
    pub readme: String,
}

/// DTO for updating an existing project. All fields are optional.
///
/// `parent_id: Some(None)` moves the project to the root.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub readme: Option<String>,
    pub parent_id: Option<Option<DbId>>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.readme.is_none()
            && self.parent_id.is_none()
    }
}
