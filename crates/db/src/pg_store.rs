//! [`ProjectRoleStore`] backed by PostgreSQL through the repositories.

use async_trait::async_trait;
use roster_core::error::CoreError;
use roster_core::remote::{build_secret, sanitize_site_url, SiteMode};
use roster_core::settings::ProjectRolesSettings;
use roster_core::types::{DbId, Timestamp};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::remote::{CreateRemoteSite, RemoteProject, RemoteSite, UpsertRemoteProject};
use crate::models::role::{
    CreateRoleAssignment, Role, RoleAssignmentDetail, UpdateRoleAssignment,
};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::{
    GroupRepo, ProjectRepo, RemoteProjectRepo, RemoteSiteRepo, RoleAssignmentRepo, RoleRepo,
    UserRepo,
};
use crate::store::{ProjectRoleStore, StoreResult};
use crate::validation::{check_assignment_save, check_project_save, check_remote_site_create};

/// PostgreSQL store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    settings: ProjectRolesSettings,
}

impl PgStore {
    pub fn new(pool: PgPool, settings: ProjectRolesSettings) -> Self {
        Self { pool, settings }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn assignment_detail(&self, id: DbId) -> StoreResult<RoleAssignmentDetail> {
        RoleAssignmentRepo::find_detail_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "role_assignment",
                    id,
                }
                .into()
            })
    }
}

#[async_trait]
impl ProjectRoleStore for PgStore {
    fn settings(&self) -> &ProjectRolesSettings {
        &self.settings
    }

    async fn health_check(&self) -> StoreResult<()> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn update_user(&self, id: DbId, input: &UpdateUser) -> StoreResult<User> {
        UserRepo::update(&self.pool, id, input)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "user", id }.into())
    }

    async fn user_groups(&self, user_id: DbId) -> StoreResult<Vec<String>> {
        Ok(GroupRepo::names_for_user(&self.pool, user_id).await?)
    }

    async fn add_user_to_group(&self, user_id: DbId, group: &str) -> StoreResult<bool> {
        let group = GroupRepo::get_or_create(&self.pool, group).await?;
        Ok(GroupRepo::add_member(&self.pool, user_id, group.id).await?)
    }

    async fn remove_user_from_group(&self, user_id: DbId, group: &str) -> StoreResult<bool> {
        Ok(GroupRepo::remove_member(&self.pool, user_id, group).await?)
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(RoleRepo::find_by_name(&self.pool, name).await?)
    }

    async fn find_role_by_id(&self, id: DbId) -> StoreResult<Option<Role>> {
        Ok(RoleRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_project_by_id(&self, id: DbId) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_project_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_uuid(&self.pool, uuid).await?)
    }

    async fn find_project_by_title(
        &self,
        parent_id: Option<DbId>,
        title: &str,
    ) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_parent_and_title(&self.pool, parent_id, title).await?)
    }

    async fn project_children(&self, project_id: DbId) -> StoreResult<Vec<Project>> {
        Ok(ProjectRepo::list_children(&self.pool, project_id).await?)
    }

    async fn create_project(&self, input: &CreateProject) -> StoreResult<Project> {
        check_project_save(self, None, &input.title, input.parent_id).await?;
        Ok(ProjectRepo::create(&self.pool, input).await?)
    }

    async fn update_project(&self, id: DbId, input: &UpdateProject) -> StoreResult<Project> {
        let current = ProjectRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "project",
                id,
            })?;
        let title = input.title.as_deref().unwrap_or(&current.title);
        let parent_id = input.parent_id.unwrap_or(current.parent_id);
        check_project_save(self, Some(id), title, parent_id).await?;

        ProjectRepo::update(&self.pool, id, input)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "project",
                    id,
                }
                .into()
            })
    }

    async fn project_assignments(&self, project_id: DbId) -> StoreResult<Vec<RoleAssignmentDetail>> {
        Ok(RoleAssignmentRepo::list_for_project(&self.pool, project_id).await?)
    }

    async fn find_assignment(
        &self,
        project_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<RoleAssignmentDetail>> {
        Ok(RoleAssignmentRepo::find_by_project_and_user(&self.pool, project_id, user_id).await?)
    }

    async fn create_assignment(
        &self,
        input: &CreateRoleAssignment,
    ) -> StoreResult<RoleAssignmentDetail> {
        check_assignment_save(self, None, input.project_id, input.user_id, input.role_id).await?;
        let created = RoleAssignmentRepo::create(&self.pool, input).await?;
        self.assignment_detail(created.id).await
    }

    async fn update_assignment(
        &self,
        id: DbId,
        input: &UpdateRoleAssignment,
    ) -> StoreResult<RoleAssignmentDetail> {
        let current = self.assignment_detail(id).await?;
        check_assignment_save(self, Some(id), current.project_id, input.user_id, input.role_id)
            .await?;
        RoleAssignmentRepo::update(&self.pool, id, input).await?;
        self.assignment_detail(id).await
    }

    async fn delete_assignment(&self, id: DbId) -> StoreResult<bool> {
        Ok(RoleAssignmentRepo::delete(&self.pool, id).await?)
    }

    async fn list_remote_sites(&self) -> StoreResult<Vec<RemoteSite>> {
        Ok(RemoteSiteRepo::list(&self.pool).await?)
    }

    async fn find_remote_site_by_uuid(&self, uuid: Uuid) -> StoreResult<Option<RemoteSite>> {
        Ok(RemoteSiteRepo::find_by_uuid(&self.pool, uuid).await?)
    }

    async fn find_remote_site_by_secret(
        &self,
        secret: &str,
        mode: SiteMode,
    ) -> StoreResult<Option<RemoteSite>> {
        Ok(RemoteSiteRepo::find_by_secret(&self.pool, secret, mode).await?)
    }

    async fn find_source_site(&self) -> StoreResult<Option<RemoteSite>> {
        Ok(RemoteSiteRepo::find_first_by_mode(&self.pool, SiteMode::Source).await?)
    }

    async fn create_remote_site(&self, input: &CreateRemoteSite) -> StoreResult<RemoteSite> {
        let mode = check_remote_site_create(self, &input.name, &input.mode).await?;
        let secret = input.secret.clone().unwrap_or_else(build_secret);
        Ok(RemoteSiteRepo::create(
            &self.pool,
            &input.name,
            sanitize_site_url(&input.url),
            mode,
            &input.description,
            &secret,
        )
        .await?)
    }

    async fn delete_remote_site(&self, uuid: Uuid) -> StoreResult<bool> {
        Ok(RemoteSiteRepo::delete(&self.pool, uuid).await?)
    }

    async fn site_remote_projects(&self, site_id: DbId) -> StoreResult<Vec<RemoteProject>> {
        Ok(RemoteProjectRepo::list_for_site(&self.pool, site_id).await?)
    }

    async fn find_remote_project(
        &self,
        site_id: DbId,
        project_uuid: Uuid,
    ) -> StoreResult<Option<RemoteProject>> {
        Ok(RemoteProjectRepo::find(&self.pool, site_id, project_uuid).await?)
    }

    async fn upsert_remote_project(&self, input: &UpsertRemoteProject) -> StoreResult<RemoteProject> {
        Ok(RemoteProjectRepo::upsert(&self.pool, input).await?)
    }

    async fn touch_remote_projects(&self, site_id: DbId) -> StoreResult<u64> {
        Ok(RemoteProjectRepo::touch_for_site(&self.pool, site_id).await?)
    }

    async fn site_last_access(&self, site_id: DbId) -> StoreResult<Option<Timestamp>> {
        Ok(RemoteProjectRepo::last_access(&self.pool, site_id).await?)
    }

    async fn find_project_source_site(&self, project_uuid: Uuid) -> StoreResult<Option<RemoteSite>> {
        Ok(RemoteProjectRepo::find_site_for_project(&self.pool, project_uuid, SiteMode::Source).await?)
    }
}
