//! Well-known role names and the role assignment invariants.
//!
//! Role names must match the seed data in the `roles` migration.

use crate::error::CoreError;
use crate::project::ProjectType;
use crate::types::DbId;

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_DELEGATE: &str = "delegate";
pub const ROLE_CONTRIBUTOR: &str = "contributor";
pub const ROLE_GUEST: &str = "guest";

/// Delegates allowed per project when no limit is configured.
pub const DEFAULT_DELEGATE_LIMIT: u32 = 1;

/// An assignment already stored for the project being validated.
#[derive(Debug, Clone)]
pub struct ExistingAssignment<'a> {
    pub id: DbId,
    pub user_id: DbId,
    pub username: &'a str,
    pub role_name: &'a str,
}

/// An assignment about to be inserted (`id == None`) or updated.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentCandidate<'a> {
    pub id: Option<DbId>,
    pub user_id: DbId,
    pub username: &'a str,
    pub role_name: &'a str,
    pub project_title: &'a str,
    pub project_type: ProjectType,
    /// The project is a local mirror of a project owned by a source site.
    pub project_is_remote: bool,
}

/// Check a role assignment against the project's current roster.
///
/// `delegate_limit == 0` means unlimited. The limit is not applied to
/// remote mirrors: the source site enforces its own.
pub fn validate_assignment(
    candidate: &AssignmentCandidate<'_>,
    roster: &[ExistingAssignment<'_>],
    delegate_limit: u32,
) -> Result<(), CoreError> {
    let others: Vec<&ExistingAssignment<'_>> = roster
        .iter()
        .filter(|a| Some(a.id) != candidate.id)
        .collect();

    if let Some(existing) = others.iter().find(|a| a.user_id == candidate.user_id) {
        return Err(CoreError::Validation(format!(
            "Role {} already set for {} in {}",
            existing.role_name, existing.username, candidate.project_title
        )));
    }

    if candidate.role_name == ROLE_OWNER {
        if let Some(owner) = others.iter().find(|a| a.role_name == ROLE_OWNER) {
            return Err(CoreError::Validation(format!(
                "User {} already set as owner of {}",
                owner.username, candidate.project_title
            )));
        }
    }

    if candidate.role_name == ROLE_DELEGATE && !candidate.project_is_remote && delegate_limit != 0
    {
        let delegates = others.iter().filter(|a| a.role_name == ROLE_DELEGATE).count();
        if delegates >= delegate_limit as usize {
            return Err(CoreError::Validation(format!(
                "The limit ({delegate_limit}) of delegates for this project has already been reached."
            )));
        }
    }

    if candidate.project_type == ProjectType::Category && candidate.role_name != ROLE_OWNER {
        return Err(CoreError::Validation(
            "Only the role of project owner is allowed for categories".to_string(),
        ));
    }

    Ok(())
}
