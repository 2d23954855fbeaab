//! The persistence contract consumed by the sync engine and the HTTP layer.
//!
//! [`ProjectRoleStore`] is implemented by [`crate::PgStore`] for production
//! and by [`crate::MemoryStore`] for tests. Both apply the model invariants
//! from `roster_core` before any write commits (see [`crate::validation`]).

use std::collections::HashSet;

use async_trait::async_trait;
use roster_core::error::CoreError;
use roster_core::project::full_title;
use roster_core::remote::SiteMode;
use roster_core::roles::{ROLE_DELEGATE, ROLE_OWNER};
use roster_core::settings::ProjectRolesSettings;
use roster_core::types::{DbId, Timestamp};
use roster_core::users::domain_group;
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::remote::{CreateRemoteSite, RemoteProject, RemoteSite, UpsertRemoteProject};
use crate::models::role::{
    CreateRoleAssignment, Role, RoleAssignmentDetail, UpdateRoleAssignment,
};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Errors raised by a [`ProjectRoleStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An invariant check failed or a referenced record is missing.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Project, role, user and remote-site persistence.
#[async_trait]
pub trait ProjectRoleStore: Send + Sync {
    /// Deployment settings the invariants are evaluated against.
    fn settings(&self) -> &ProjectRolesSettings;

    async fn health_check(&self) -> StoreResult<()>;

    // ---- Users ----

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;
    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;
    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<User>;
    /// Group names of a user, sorted.
    async fn user_groups(&self, user_id: DbId) -> StoreResult<Vec<String>>;
    /// Add a membership, creating the group on demand.
    async fn add_user_to_group(&self, user_id: DbId, group: &str) -> StoreResult<bool>;
    async fn remove_user_from_group(&self, user_id: DbId, group: &str) -> StoreResult<bool>;

    // ---- Roles ----

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;
    async fn find_role_by_id(&self, id: DbId) -> StoreResult<Option<Role>>;

    // ---- Projects ----

    async fn find_project_by_id(&self, id: DbId) -> StoreResult<Option<Project>>;
    async fn find_project_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<Project>>;
    /// The project titled `title` directly under `parent_id` (root if `None`).
    async fn find_project_by_title(
        &self,
        parent_id: Option<DbId>,
        title: &str,
    ) -> StoreResult<Option<Project>>;
    /// Submitted direct children, ordered by title.
    async fn project_children(&self, project_id: DbId) -> StoreResult<Vec<Project>>;
    async fn create_project(&self, input: &CreateProject) -> StoreResult<Project>;
    async fn update_project(&self, id: DbId, input: &UpdateProject) -> StoreResult<Project>;

    // ---- Role assignments ----

    async fn project_assignments(&self, project_id: DbId) -> StoreResult<Vec<RoleAssignmentDetail>>;
    async fn find_assignment(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<RoleAssignmentDetail>>;
    async fn create_assignment(
        &self,
        input: &CreateRoleAssignment,
    ) -> StoreResult<RoleAssignmentDetail>;
    async fn update_assignment(
        &self,
        id: DbId,
        input: &UpdateRoleAssignment,
    ) -> StoreResult<RoleAssignmentDetail>;
    async fn delete_assignment(&self, id: DbId) -> StoreResult<bool>;

    // ---- Remote sites ----

    async fn list_remote_sites(&self) -> StoreResult<Vec<RemoteSite>>;
    async fn find_remote_site_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<RemoteSite>>;
    async fn find_remote_site_by_secret(
        &self,
        secret: &str,
        mode: SiteMode,
    ) -> StoreResult<Option<RemoteSite>>;
    /// The source site this deployment pulls from, if registered.
    async fn find_source_site(&self) -> StoreResult<Option<RemoteSite>>;
    async fn create_remote_site(&self, input: &CreateRemoteSite) -> StoreResult<RemoteSite>;
    async fn delete_remote_site(&self, uuid: Uuid) -> StoreResult<bool>;

    // ---- Remote project grants ----

    async fn site_remote_projects(&self, site_id: DbId) -> StoreResult<Vec<RemoteProject>>;
    async fn find_remote_project(
        &self,
        site_id: DbId,
        project_uuid: Uuid,
    ) -> StoreResult<Option<RemoteProject>>;
    /// Insert or update a grant, refreshing its access date.
    async fn upsert_remote_project(&self, input: &UpsertRemoteProject) -> StoreResult<RemoteProject>;
    /// Refresh the access date of every grant of a site.
    async fn touch_remote_projects(&self, site_id: DbId) -> StoreResult<u64>;
    /// Newest access date among the grants of a site.
    async fn site_last_access(&self, site_id: DbId) -> StoreResult<Option<Timestamp>>;
    /// The `SOURCE` site holding a grant for `project_uuid`.
    async fn find_project_source_site(&self, project_uuid: Uuid) -> StoreResult<Option<RemoteSite>>;

    // ---- Derived queries ----

    /// Add a federated user to the group named after their domain.
    ///
    /// Returns the group name if the membership was new.
    async fn set_user_group(&self, user: &User) -> StoreResult<Option<String>> {
        let Some(group) = domain_group(&user.username) else {
            return Ok(None);
        };
        if self.add_user_to_group(user.id, &group).await? {
            return Ok(Some(group));
        }
        Ok(None)
    }

    /// Whether the project is a local mirror of a source site's project.
    async fn is_remote(&self, project: &Project) -> StoreResult<bool> {
        if self.settings().site_mode != SiteMode::Target {
            return Ok(false);
        }
        Ok(self.find_project_source_site(project.uuid).await?.is_some())
    }

    async fn project_owner(&self, project_id: DbId) -> StoreResult<Option<RoleAssignmentDetail>> {
        Ok(self
            .project_assignments(project_id)
            .await?
            .into_iter()
            .find(|a| a.role_name == ROLE_OWNER))
    }

    async fn project_delegates(&self, project_id: DbId) -> StoreResult<Vec<RoleAssignmentDetail>> {
        Ok(self
            .project_assignments(project_id)
            .await?
            .into_iter()
            .filter(|a| a.role_name == ROLE_DELEGATE)
            .collect())
    }

    /// Assignments other than the owner and delegates.
    async fn project_members(&self, project_id: DbId) -> StoreResult<Vec<RoleAssignmentDetail>> {
        Ok(self
            .project_assignments(project_id)
            .await?
            .into_iter()
            .filter(|a| a.role_name != ROLE_OWNER && a.role_name != ROLE_DELEGATE)
            .collect())
    }

    /// Ancestors of a project, root first.
    async fn project_ancestors(&self, project: &Project) -> StoreResult<Vec<Project>> {
        let mut chain = Vec::new();
        let mut seen = HashSet::from([project.id]);
        let mut next = project.parent_id;

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                return Err(CoreError::Internal(format!(
                    "Cycle in project tree at project {parent_id}"
                ))
                .into());
            }
            let parent = self
                .find_project_by_id(parent_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "project",
                    id: parent_id,
                })?;
            next = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Depth in the tree; root projects are at depth 0.
    async fn project_depth(&self, project: &Project) -> StoreResult<usize> {
        Ok(self.project_ancestors(project).await?.len())
    }

    /// Titles from the root down, joined with `" / "`.
    async fn project_full_title(&self, project: &Project) -> StoreResult<String> {
        let ancestors = self.project_ancestors(project).await?;
        Ok(full_title(
            ancestors.iter().map(|p| p.title.as_str()),
            &project.title,
        ))
    }

    /// Whether the user holds any role on the project or, with
    /// `include_children`, on any project below it.
    async fn has_role(
        &self,
        project: &Project,
        user_id: DbId,
        include_children: bool,
    ) -> StoreResult<bool> {
        let mut pending = vec![project.clone()];
        while let Some(current) = pending.pop() {
            if self.find_assignment(current.id, user_id).await?.is_some() {
                return Ok(true);
            }
            if include_children && current.is_category() {
                pending.extend(self.project_children(current.id).await?);
            }
        }
        Ok(false)
    }

    /// The local project a grant refers to, by foreign key or by UUID.
    async fn remote_project_local(&self, grant: &RemoteProject) -> StoreResult<Option<Project>> {
        if let Some(id) = grant.project_id {
            if let Some(project) = self.find_project_by_id(id).await? {
                return Ok(Some(project));
            }
        }
        self.find_project_by_uuid(grant.project_uuid).await
    }
}
