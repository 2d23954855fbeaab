//! Project tree types and the invariants every project save must satisfy.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Submission status of a project that is fully created.
pub const SUBMIT_STATUS_OK: &str = "OK";
/// Submission status of a project still being created.
pub const SUBMIT_STATUS_PENDING: &str = "PENDING";

/// Separator used when joining titles along the tree.
pub const FULL_TITLE_SEPARATOR: &str = " / ";

/// Kind of a node in the project tree.
///
/// Only categories may contain children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProjectType {
    Category,
    Project,
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Category => "CATEGORY",
            ProjectType::Project => "PROJECT",
        }
    }

    /// Lowercase label used in log lines and status messages.
    pub fn label(self) -> &'static str {
        match self {
            ProjectType::Category => "category",
            ProjectType::Project => "project",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CATEGORY" => Ok(ProjectType::Category),
            "PROJECT" => Ok(ProjectType::Project),
            other => Err(CoreError::Validation(format!(
                "Unknown project type \"{other}\""
            ))),
        }
    }
}

impl TryFrom<String> for ProjectType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The parent side of a project save, as far as validation is concerned.
#[derive(Debug, Clone, Copy)]
pub struct ParentRef<'a> {
    pub id: DbId,
    pub title: &'a str,
    pub project_type: ProjectType,
}

/// A project about to be inserted (`id == None`) or updated.
#[derive(Debug, Clone, Copy)]
pub struct ProjectCandidate<'a> {
    pub id: Option<DbId>,
    pub title: &'a str,
    pub parent: Option<ParentRef<'a>>,
}

/// Check the per-save project invariants.
///
/// The `(title, parent)` uniqueness rule needs a lookup and is enforced by
/// the store; see [`duplicate_title_error`].
pub fn validate_project(candidate: &ProjectCandidate<'_>) -> Result<(), CoreError> {
    let Some(parent) = candidate.parent else {
        return Ok(());
    };

    if candidate.id == Some(parent.id) {
        return Err(CoreError::Validation(
            "Project can not be set as its own parent".to_string(),
        ));
    }
    if candidate.title == parent.title {
        return Err(CoreError::Validation(
            "Project and parent titles can not be equal".to_string(),
        ));
    }
    if parent.project_type == ProjectType::Project {
        return Err(CoreError::Validation(
            "Subprojects are only allowed within categories".to_string(),
        ));
    }
    Ok(())
}

/// Message for a sibling with the same title under the same parent.
pub fn duplicate_title_message(existing_type: ProjectType, title: &str) -> String {
    format!(
        "{} with the title \"{}\" exists under the same parent",
        capitalize(existing_type.label()),
        title
    )
}

/// Error raised when a sibling with the same title already exists.
pub fn duplicate_title_error(existing_type: ProjectType, title: &str) -> CoreError {
    CoreError::Conflict(duplicate_title_message(existing_type, title))
}

/// Join ancestor titles (root first) and the project title.
pub fn full_title<'a>(ancestors: impl IntoIterator<Item = &'a str>, title: &str) -> String {
    let mut parts: Vec<&str> = ancestors.into_iter().collect();
    parts.push(title);
    parts.join(FULL_TITLE_SEPARATOR)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
