//! In-process [`ProjectRoleStore`] used by engine and HTTP tests.
//!
//! Applies the same pre-save checks as [`crate::PgStore`] and mirrors the
//! database unique constraints.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::Utc;
use roster_core::error::CoreError;
use roster_core::project::SUBMIT_STATUS_OK;
use roster_core::remote::{build_secret, sanitize_site_url, SiteMode};
use roster_core::roles::{ROLE_CONTRIBUTOR, ROLE_DELEGATE, ROLE_GUEST, ROLE_OWNER};
use roster_core::settings::ProjectRolesSettings;
use roster_core::types::{DbId, Timestamp};
use roster_core::users::normalize_federated_username;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::remote::{CreateRemoteSite, RemoteProject, RemoteSite, UpsertRemoteProject};
use crate::models::role::{
    CreateRoleAssignment, Role, RoleAssignment, RoleAssignmentDetail, UpdateRoleAssignment,
};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::store::{ProjectRoleStore, StoreResult};
use crate::validation::{check_assignment_save, check_project_save, check_remote_site_create};

#[derive(Debug, Default)]
struct Tables {
    last_id: DbId,
    users: Vec<User>,
    /// `(user_id, group name)`; groups exist while they have members.
    memberships: BTreeSet<(DbId, String)>,
    roles: Vec<Role>,
    projects: Vec<Project>,
    assignments: Vec<RoleAssignment>,
    sites: Vec<RemoteSite>,
    remote_projects: Vec<RemoteProject>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn detail(&self, a: &RoleAssignment) -> RoleAssignmentDetail {
        let username = self
            .users
            .iter()
            .find(|u| u.id == a.user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        let role_name = self
            .roles
            .iter()
            .find(|r| r.id == a.role_id)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        RoleAssignmentDetail {
            id: a.id,
            uuid: a.uuid,
            project_id: a.project_id,
            user_id: a.user_id,
            username,
            role_id: a.role_id,
            role_name,
        }
    }
}

/// Thread-safe in-memory store seeded with the standard roles.
#[derive(Debug)]
pub struct MemoryStore {
    settings: ProjectRolesSettings,
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new(settings: ProjectRolesSettings) -> Self {
        let mut tables = Tables::default();
        for (name, description) in [
            (ROLE_OWNER, "Project owner"),
            (ROLE_DELEGATE, "Project delegate"),
            (ROLE_CONTRIBUTOR, "Project contributor"),
            (ROLE_GUEST, "Project guest"),
        ] {
            let id = tables.next_id();
            tables.roles.push(Role {
                id,
                name: name.to_string(),
                description: description.to_string(),
            });
        }
        Self {
            settings,
            tables: RwLock::new(tables),
        }
    }

    /// Number of stored projects.
    pub async fn project_count(&self) -> usize {
        self.tables.read().await.projects.len()
    }

    /// Number of stored role assignments.
    pub async fn assignment_count(&self) -> usize {
        self.tables.read().await.assignments.len()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.tables.read().await.users.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(ProjectRolesSettings::default())
    }
}

fn not_found(entity: &'static str, id: DbId) -> CoreError {
    CoreError::NotFound { entity, id }
}

#[async_trait]
impl ProjectRoleStore for MemoryStore {
    fn settings(&self) -> &ProjectRolesSettings {
        &self.settings
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let username = normalize_federated_username(username);
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        let uuid = input.uuid.unwrap_or_else(Uuid::new_v4);
        let username = normalize_federated_username(&input.username);
        if t.users.iter().any(|u| u.username == username || u.uuid == uuid) {
            return Err(CoreError::Conflict(format!("User \"{username}\" already exists")).into());
        }
        let now = Utc::now();
        let user = User {
            id: t.next_id(),
            uuid,
            username,
            name: input.name.clone(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email: input.email.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<User> {
        let mut t = self.tables.write().await;
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(not_found("user", id))?;
        if let Some(v) = &input.name {
            user.name = v.clone();
        }
        if let Some(v) = &input.first_name {
            user.first_name = v.clone();
        }
        if let Some(v) = &input.last_name {
            user.last_name = v.clone();
        }
        if let Some(v) = &input.email {
            user.email = v.clone();
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn user_groups(&self, user_id: DbId) -> StoreResult<Vec<String>> {
        let t = self.tables.read().await;
        Ok(t.memberships
            .iter()
            .filter(|(uid, _)| *uid == user_id)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn add_user_to_group(&self, user_id: DbId, group: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        Ok(t.memberships.insert((user_id, group.to_string())))
    }

    async fn remove_user_from_group(&self, user_id: DbId, group: &str) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        Ok(t.memberships.remove(&(user_id, group.to_string())))
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let t = self.tables.read().await;
        Ok(t.roles.iter().find(|r| r.name == name).cloned())
    }

    async fn find_role_by_id(&self, id: DbId) -> StoreResult<Option<Role>> {
        let t = self.tables.read().await;
        Ok(t.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_project_by_id(&self, id: DbId) -> StoreResult<Option<Project>> {
        let t = self.tables.read().await;
        Ok(t.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_project_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<Project>> {
        let t = self.tables.read().await;
        Ok(t.projects.iter().find(|p| p.uuid == uuid).cloned())
    }

    async fn find_project_by_title(
        &self,
        parent_id: Option<DbId>,
        title: &str,
    ) -> StoreResult<Option<Project>> {
        let t = self.tables.read().await;
        Ok(t.projects
            .iter()
            .find(|p| p.parent_id == parent_id && p.title == title)
            .cloned())
    }

    async fn project_children(&self, project_id: DbId) -> StoreResult<Vec<Project>> {
        let t = self.tables.read().await;
        let mut children: Vec<Project> = t
            .projects
            .iter()
            .filter(|p| p.parent_id == Some(project_id) && p.is_submitted())
            .cloned()
            .collect();
        children.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(children)
    }

    async fn create_project(&self, input: &CreateProject) -> StoreResult<Project> {
        check_project_save(self, None, &input.title, input.parent_id).await?;

        let mut t = self.tables.write().await;
        let uuid = input.uuid.unwrap_or_else(Uuid::new_v4);
        if t.projects.iter().any(|p| p.uuid == uuid) {
            return Err(CoreError::Conflict(format!("Project {uuid} already exists")).into());
        }
        let now = Utc::now();
        let project = Project {
            id: t.next_id(),
            uuid,
            title: input.title.clone(),
            project_type: input.project_type,
            parent_id: input.parent_id,
            description: input.description.clone(),
            readme: input.readme.clone(),
            submit_status: SUBMIT_STATUS_OK.to_string(),
            created_at: now,
            updated_at: now,
        };
        t.projects.push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: DbId, input: &UpdateProject) -> StoreResult<Project> {
        let current = self
            .find_project_by_id(id)
            .await?
            .ok_or(not_found("project", id))?;
        let title = input.title.as_deref().unwrap_or(&current.title);
        let parent_id = input.parent_id.unwrap_or(current.parent_id);
        check_project_save(self, Some(id), title, parent_id).await?;

        let mut t = self.tables.write().await;
        let project = t
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(not_found("project", id))?;
        if let Some(v) = &input.title {
            project.title = v.clone();
        }
        if let Some(v) = &input.description {
            project.description = Some(v.clone());
        }
        if let Some(v) = &input.readme {
            project.readme = v.clone();
        }
        if let Some(v) = input.parent_id {
            project.parent_id = v;
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn project_assignments(&self, project_id: DbId) -> StoreResult<Vec<RoleAssignmentDetail>> {
        let t = self.tables.read().await;
        Ok(t.assignments
            .iter()
            .filter(|a| a.project_id == project_id)
            .map(|a| t.detail(a))
            .collect())
    }

    async fn find_assignment(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<RoleAssignmentDetail>> {
        let t = self.tables.read().await;
        Ok(t.assignments
            .iter()
            .find(|a| a.project_id == project_id && a.user_id == user_id)
            .map(|a| t.detail(a)))
    }

    async fn create_assignment(
        &self,
        input: &CreateRoleAssignment,
    ) -> StoreResult<RoleAssignmentDetail> {
        check_assignment_save(self, None, input.project_id, input.user_id, input.role_id).await?;

        let mut t = self.tables.write().await;
        let uuid = input.uuid.unwrap_or_else(Uuid::new_v4);
        if t.assignments.iter().any(|a| a.uuid == uuid) {
            return Err(CoreError::Conflict(format!("Role assignment {uuid} already exists")).into());
        }
        let now = Utc::now();
        let assignment = RoleAssignment {
            id: t.next_id(),
            uuid,
            project_id: input.project_id,
            user_id: input.user_id,
            role_id: input.role_id,
            created_at: now,
            updated_at: now,
        };
        let detail = t.detail(&assignment);
        t.assignments.push(assignment);
        Ok(detail)
    }

    async fn update_assignment(
        &self,
        id: DbId,
        input: &UpdateRoleAssignment,
    ) -> StoreResult<RoleAssignmentDetail> {
        let project_id = {
            let t = self.tables.read().await;
            t.assignments
                .iter()
                .find(|a| a.id == id)
                .map(|a| a.project_id)
                .ok_or(not_found("role_assignment", id))?
        };
        check_assignment_save(self, Some(id), project_id, input.user_id, input.role_id).await?;

        let mut t = self.tables.write().await;
        let assignment = t
            .assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(not_found("role_assignment", id))?;
        assignment.user_id = input.user_id;
        assignment.role_id = input.role_id;
        assignment.updated_at = Utc::now();
        let updated = assignment.clone();
        Ok(t.detail(&updated))
    }

    async fn delete_assignment(&self, id: DbId) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let before = t.assignments.len();
        t.assignments.retain(|a| a.id != id);
        Ok(t.assignments.len() < before)
    }

    async fn list_remote_sites(&self) -> StoreResult<Vec<RemoteSite>> {
        let t = self.tables.read().await;
        let mut sites = t.sites.clone();
        sites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sites)
    }

    async fn find_remote_site_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<RemoteSite>> {
        let t = self.tables.read().await;
        Ok(t.sites.iter().find(|s| s.uuid == uuid).cloned())
    }

    async fn find_remote_site_by_secret(
        &self,
        secret: &str,
        mode: SiteMode,
    ) -> StoreResult<Option<RemoteSite>> {
        let t = self.tables.read().await;
        Ok(t.sites
            .iter()
            .find(|s| s.secret == secret && s.mode == mode)
            .cloned())
    }

    async fn find_source_site(&self) -> StoreResult<Option<RemoteSite>> {
        let t = self.tables.read().await;
        Ok(t.sites.iter().find(|s| s.mode == SiteMode::Source).cloned())
    }

    async fn create_remote_site(&self, input: &CreateRemoteSite) -> StoreResult<RemoteSite> {
        let mode = check_remote_site_create(self, &input.name, &input.mode).await?;

        let mut t = self.tables.write().await;
        let secret = input.secret.clone().unwrap_or_else(build_secret);
        let url = sanitize_site_url(&input.url).to_string();
        if t
            .sites
            .iter()
            .any(|s| s.url == url && s.mode == mode && s.secret == secret)
        {
            return Err(CoreError::Conflict(format!(
                "Remote site for \"{url}\" with the same mode and secret already exists"
            ))
            .into());
        }
        let now = Utc::now();
        let site = RemoteSite {
            id: t.next_id(),
            uuid: Uuid::new_v4(),
            name: input.name.clone(),
            url,
            mode,
            description: input.description.clone(),
            secret,
            created_at: now,
            updated_at: now,
        };
        t.sites.push(site.clone());
        Ok(site)
    }

    async fn delete_remote_site(&self, uuid: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.write().await;
        let Some(site_id) = t.sites.iter().find(|s| s.uuid == uuid).map(|s| s.id) else {
            return Ok(false);
        };
        t.sites.retain(|s| s.id != site_id);
        t.remote_projects.retain(|rp| rp.site_id != site_id);
        Ok(true)
    }

    async fn site_remote_projects(&self, site_id: DbId) -> StoreResult<Vec<RemoteProject>> {
        let t = self.tables.read().await;
        Ok(t.remote_projects
            .iter()
            .filter(|rp| rp.site_id == site_id)
            .cloned()
            .collect())
    }

    async fn find_remote_project(
        &self,
        site_id: DbId,
        project_uuid: Uuid,
    ) -> StoreResult<Option<RemoteProject>> {
        let t = self.tables.read().await;
        Ok(t.remote_projects
            .iter()
            .find(|rp| rp.site_id == site_id && rp.project_uuid == project_uuid)
            .cloned())
    }

    async fn upsert_remote_project(&self, input: &UpsertRemoteProject) -> StoreResult<RemoteProject> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        if let Some(existing) = t
            .remote_projects
            .iter_mut()
            .find(|rp| rp.site_id == input.site_id && rp.project_uuid == input.project_uuid)
        {
            if input.project_id.is_some() {
                existing.project_id = input.project_id;
            }
            existing.level = input.level;
            existing.date_access = Some(now);
            return Ok(existing.clone());
        }
        let grant = RemoteProject {
            id: t.next_id(),
            uuid: Uuid::new_v4(),
            project_uuid: input.project_uuid,
            project_id: input.project_id,
            site_id: input.site_id,
            level: input.level,
            date_access: Some(now),
        };
        t.remote_projects.push(grant.clone());
        Ok(grant)
    }

    async fn touch_remote_projects(&self, site_id: DbId) -> StoreResult<u64> {
        let mut t = self.tables.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for rp in t.remote_projects.iter_mut().filter(|rp| rp.site_id == site_id) {
            rp.date_access = Some(now);
            touched += 1;
        }
        Ok(touched)
    }

    async fn site_last_access(&self, site_id: DbId) -> StoreResult<Option<Timestamp>> {
        let t = self.tables.read().await;
        Ok(t.remote_projects
            .iter()
            .filter(|rp| rp.site_id == site_id)
            .filter_map(|rp| rp.date_access)
            .max())
    }

    async fn find_project_source_site(&self, project_uuid: Uuid) -> StoreResult<Option<RemoteSite>> {
        let t = self.tables.read().await;
        let site_ids: BTreeSet<DbId> = t
            .remote_projects
            .iter()
            .filter(|rp| rp.project_uuid == project_uuid)
            .map(|rp| rp.site_id)
            .collect();
        Ok(t.sites
            .iter()
            .find(|s| s.mode == SiteMode::Source && site_ids.contains(&s.id))
            .cloned())
    }
}
