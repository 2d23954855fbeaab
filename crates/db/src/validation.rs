//! Pre-save invariant checks shared by the store implementations.
//!
//! These gather the rows the pure rules in `roster_core` need and run them.
//! Each check must complete before the caller takes any write lock.

use std::collections::HashSet;

use roster_core::error::CoreError;
use roster_core::project::{duplicate_title_error, validate_project, ParentRef, ProjectCandidate};
use roster_core::remote::SiteMode;
use roster_core::roles::{validate_assignment, AssignmentCandidate, ExistingAssignment};
use roster_core::types::DbId;

use crate::store::{ProjectRoleStore, StoreResult};

/// Check a project insert (`id == None`) or update.
pub async fn check_project_save<S>(
    store: &S,
    id: Option<DbId>,
    title: &str,
    parent_id: Option<DbId>,
) -> StoreResult<()>
where
    S: ProjectRoleStore + ?Sized,
{
    let parent = match parent_id {
        Some(pid) => Some(
            store
                .find_project_by_id(pid)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "project",
                    id: pid,
                })?,
        ),
        None => None,
    };

    validate_project(&ProjectCandidate {
        id,
        title,
        parent: parent.as_ref().map(|p| ParentRef {
            id: p.id,
            title: &p.title,
            project_type: p.project_type,
        }),
    })?;

    if let (Some(id), Some(parent)) = (id, parent.as_ref()) {
        check_not_descendant(store, id, parent.parent_id).await?;
    }

    if let Some(existing) = store.find_project_by_title(parent_id, title).await? {
        if Some(existing.id) != id {
            return Err(duplicate_title_error(existing.project_type, title).into());
        }
    }
    Ok(())
}

/// Reject moving project `id` below one of its own descendants.
///
/// `next` is the grandparent of the new position; the direct parent has
/// already been compared against `id`.
async fn check_not_descendant<S>(store: &S, id: DbId, mut next: Option<DbId>) -> StoreResult<()>
where
    S: ProjectRoleStore + ?Sized,
{
    let mut seen = HashSet::new();
    while let Some(ancestor_id) = next {
        if ancestor_id == id {
            return Err(CoreError::Validation(
                "Project can not be set as its own parent".to_string(),
            )
            .into());
        }
        if !seen.insert(ancestor_id) {
            break;
        }
        next = store
            .find_project_by_id(ancestor_id)
            .await?
            .and_then(|p| p.parent_id);
    }
    Ok(())
}

/// Check a role assignment insert (`id == None`) or update.
pub async fn check_assignment_save<S>(
    store: &S,
    id: Option<DbId>,
    project_id: DbId,
    user_id: DbId,
    role_id: DbId,
) -> StoreResult<()>
where
    S: ProjectRoleStore + ?Sized,
{
    let project = store
        .find_project_by_id(project_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "project",
            id: project_id,
        })?;
    let user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "user",
            id: user_id,
        })?;
    let role = store
        .find_role_by_id(role_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "role",
            id: role_id,
        })?;

    let roster = store.project_assignments(project_id).await?;
    let existing: Vec<ExistingAssignment<'_>> = roster
        .iter()
        .map(|a| ExistingAssignment {
            id: a.id,
            user_id: a.user_id,
            username: &a.username,
            role_name: &a.role_name,
        })
        .collect();

    let project_is_remote = store.is_remote(&project).await?;

    validate_assignment(
        &AssignmentCandidate {
            id,
            user_id,
            username: &user.username,
            role_name: &role.name,
            project_title: &project.title,
            project_type: project.project_type,
            project_is_remote,
        },
        &existing,
        store.settings().delegate_limit,
    )?;
    Ok(())
}

/// Check a new remote site and return its parsed mode.
pub async fn check_remote_site_create<S>(store: &S, name: &str, mode: &str) -> StoreResult<SiteMode>
where
    S: ProjectRoleStore + ?Sized,
{
    let mode: SiteMode = mode.parse()?;
    let taken = store
        .list_remote_sites()
        .await?
        .into_iter()
        .any(|site| site.name == name);
    if taken {
        return Err(CoreError::Conflict(format!(
            "Remote site with the name \"{name}\" already exists"
        ))
        .into());
    }
    Ok(mode)
}
