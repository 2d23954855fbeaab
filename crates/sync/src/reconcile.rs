//! Target side: bring the local store in line with a source site's document.
//!
//! Users are synced first, then every `READ_ROLES` project together with
//! its `READ_ROLES` ancestors, root first. Per-entity problems are written
//! into the document; store failures abort the run.

use std::collections::HashSet;

use indexmap::IndexMap;
use roster_core::project::duplicate_title_message;
use roster_core::remote::RemoteLevel;
use roster_core::roles::ROLE_OWNER;
use roster_core::users::{domain_group, is_federated};
use roster_db::models::project::{CreateProject, Project};
use roster_db::models::remote::{RemoteSite, UpsertRemoteProject};
use roster_db::models::role::{CreateRoleAssignment, UpdateRoleAssignment};
use roster_db::models::user::{CreateUser, User};
use roster_db::ProjectRoleStore;
use roster_events::{
    EventBus, TimelineEvent, EVENT_REMOTE_PROJECT_CREATE, EVENT_REMOTE_PROJECT_UPDATE,
    EVENT_REMOTE_ROLE_CREATE, EVENT_REMOTE_ROLE_DELETE, EVENT_REMOTE_ROLE_UPDATE,
};
use uuid::Uuid;

use crate::document::{EntityStatus, ProjectEntry, RoleEntry, SyncDocument, UserEntry};
use crate::error::SyncError;
use crate::fields::{diff_project, diff_user};
use crate::RemoteProjectApi;

impl RemoteProjectApi<'_> {
    /// Apply `doc` from the source `site` and return it annotated with
    /// per-entity outcomes.
    ///
    /// `actor` is recorded on timeline events; it defaults to the
    /// configured default admin.
    pub async fn sync_source_data(
        &self,
        site: &RemoteSite,
        mut doc: SyncDocument,
        actor: Option<&str>,
    ) -> Result<SyncDocument, SyncError> {
        let settings = self.store.settings();
        let default_admin = match self.store.find_user_by_username(&settings.default_admin).await? {
            Some(user) => user,
            None => {
                let err = SyncError::DefaultAdminNotFound(settings.default_admin.clone());
                tracing::error!("{err}");
                return Err(err);
            }
        };

        let mut ctx = SyncContext {
            store: self.store,
            events: self.events,
            site,
            actor: actor.unwrap_or(&default_admin.username).to_string(),
            default_admin,
            allow_local: settings.allow_local_users,
            visited: HashSet::new(),
        };

        tracing::info!(site = %site.name, "Synchronizing data from remote site");

        if !doc.has_read_roles() {
            tracing::info!("No READ_ROLES access set, nothing to synchronize");
            return Ok(doc);
        }

        tracing::info!("Synchronizing federated users");
        ctx.sync_users(&mut doc).await?;
        tracing::info!("User sync OK");

        tracing::info!("Synchronizing projects");
        let keys: Vec<String> = doc
            .projects
            .iter()
            .filter(|(_, p)| p.level == RemoteLevel::ReadRoles)
            .map(|(k, _)| k.clone())
            .collect();

        for key in keys {
            if ctx.visited.contains(&key) {
                continue;
            }
            let chain = pending_lineage(&doc, &key, &ctx.visited);
            for uuid in chain.iter().rev() {
                ctx.visited.insert(uuid.clone());
                ctx.sync_project(&mut doc, uuid).await?;
            }
        }

        tracing::info!(site = %site.name, "Synchronization OK");
        Ok(doc)
    }
}

/// `key` and its unprocessed `READ_ROLES` ancestors in the document, child
/// first. Stops at the root, a visited or missing entry, a lower level, or
/// a cycle.
fn pending_lineage(doc: &SyncDocument, key: &str, visited: &HashSet<String>) -> Vec<String> {
    let mut chain = vec![key.to_string()];
    let mut current = key;

    while let Some(parent) = doc.projects.get(current).and_then(ProjectEntry::parent) {
        if visited.contains(parent) || chain.iter().any(|c| c == parent) {
            break;
        }
        match doc.projects.get(parent) {
            Some(entry) if entry.level == RemoteLevel::ReadRoles => {}
            _ => break,
        }
        chain.push(parent.to_string());
        current = parent;
    }
    chain
}

/// State of one `sync_source_data` call.
struct SyncContext<'a> {
    store: &'a dyn ProjectRoleStore,
    events: Option<&'a EventBus>,
    site: &'a RemoteSite,
    actor: String,
    default_admin: User,
    allow_local: bool,
    /// Project keys already processed in this call.
    visited: HashSet<String>,
}

/// What happened to one incoming role entry.
#[derive(Debug, Default)]
struct RoleOutcome {
    status: Option<EntityStatus>,
    status_msg: Option<String>,
    /// Replacement username written back into the entry.
    user: Option<String>,
}

impl RoleOutcome {
    fn error(msg: String) -> Self {
        tracing::error!("{msg}");
        Self {
            status: Some(EntityStatus::Error),
            status_msg: Some(msg),
            user: None,
        }
    }

    fn apply(self, entry: &mut RoleEntry) {
        if let Some(user) = self.user {
            entry.user = user;
        }
        if self.status.is_some() {
            entry.status = self.status;
        }
        if self.status_msg.is_some() {
            entry.status_msg = self.status_msg;
        }
    }
}

impl SyncContext<'_> {
    // ---- Users ----

    async fn sync_users(&self, doc: &mut SyncDocument) -> Result<(), SyncError> {
        for (key, entry) in doc.users.iter_mut() {
            if !is_federated(&entry.username) {
                continue;
            }
            if let Some(status) = self.sync_user(key, entry).await? {
                entry.status = Some(status);
            }
        }
        Ok(())
    }

    async fn sync_user(&self, key: &str, entry: &UserEntry) -> Result<Option<EntityStatus>, SyncError> {
        let Some(user) = self.store.find_user_by_username(&entry.username).await? else {
            let user = self
                .store
                .create_user(&CreateUser {
                    uuid: Uuid::parse_str(key).ok(),
                    username: entry.username.clone(),
                    name: entry.name.clone(),
                    first_name: entry.first_name.clone(),
                    last_name: entry.last_name.clone(),
                    email: entry.email.clone(),
                })
                .await?;
            for group in &entry.groups {
                self.store.add_user_to_group(user.id, group).await?;
            }
            self.store.set_user_group(&user).await?;
            tracing::info!(username = %user.username, "Created user");
            return Ok(Some(EntityStatus::Created));
        };

        let mut status = None;
        let (changes, update) = diff_user(&user, entry);
        if !changes.is_empty() {
            self.store.update_user(user.id, &update).await?;
            tracing::info!(
                username = %entry.username,
                uuid = %key,
                fields = %changes.joined(),
                "Updated user"
            );
            status = Some(EntityStatus::Updated);
        }
        if self.sync_groups(&user, &entry.groups).await? {
            status = Some(EntityStatus::Updated);
        }
        Ok(status)
    }

    /// Make the user's memberships equal `incoming` plus their domain
    /// group. Returns whether anything changed.
    async fn sync_groups(&self, user: &User, incoming: &[String]) -> Result<bool, SyncError> {
        let current = self.store.user_groups(user.id).await?;
        let domain = domain_group(&user.username);
        let mut wanted: Vec<&str> = incoming
            .iter()
            .map(String::as_str)
            .chain(domain.as_deref())
            .collect();
        wanted.sort_unstable();
        wanted.dedup();
        if current.iter().map(String::as_str).eq(wanted.iter().copied()) {
            return Ok(false);
        }

        for group in current.iter().filter(|g| !wanted.contains(&g.as_str())) {
            self.store.remove_user_from_group(user.id, group).await?;
            tracing::debug!(username = %user.username, group = %group, "Removed user from group");
        }
        for group in wanted.iter().filter(|g| !current.iter().any(|c| c.as_str() == **g)) {
            self.store.add_user_to_group(user.id, group).await?;
            tracing::debug!(username = %user.username, group = %group, "Added user to group");
        }
        Ok(true)
    }

    // ---- Projects ----

    async fn sync_project(&self, doc: &mut SyncDocument, key: &str) -> Result<(), SyncError> {
        let Some(entry) = doc.projects.get(key).cloned() else {
            return Ok(());
        };
        tracing::info!(
            kind = entry.project_type.label(),
            title = %entry.title,
            uuid = %key,
            "Processing project"
        );

        let Ok(uuid) = Uuid::parse_str(key) else {
            project_error(doc, key, &entry, "create", format!("Invalid project UUID \"{key}\""));
            return Ok(());
        };

        let local = self.store.find_project_by_uuid(uuid).await?;
        let action = if local.is_some() { "update" } else { "create" };

        if let Some(project) = &local {
            if project.project_type != entry.project_type {
                let msg = format!(
                    "Local {} with the same UUID has a different type",
                    project.project_type.label()
                );
                project_error(doc, key, &entry, action, msg);
                return Ok(());
            }
        }

        let parent = match entry.parent() {
            Some(parent_key) => {
                let found = match Uuid::parse_str(parent_key) {
                    Ok(parent_uuid) => self.store.find_project_by_uuid(parent_uuid).await?,
                    Err(_) => None,
                };
                match found {
                    Some(parent) => Some(parent),
                    None => {
                        project_error(doc, key, &entry, action, format!("Parent {parent_key} not found"));
                        return Ok(());
                    }
                }
            }
            None => None,
        };

        let project = match local {
            Some(project) => self.update_project(doc, key, &entry, project, parent.as_ref()).await?,
            None => match self.create_project(doc, key, uuid, &entry, parent.as_ref()).await? {
                Some(project) => project,
                None => return Ok(()),
            },
        };

        let grant = self
            .store
            .upsert_remote_project(&UpsertRemoteProject {
                site_id: self.site.id,
                project_uuid: project.uuid,
                project_id: Some(project.id),
                level: entry.level,
            })
            .await?;
        tracing::debug!(remote_project = %grant.uuid, level = %grant.level, "Stored remote project");

        if !entry.level.includes_roles() {
            return Ok(());
        }

        self.update_roles(doc, key, &project, &entry).await?;
        self.remove_deleted_roles(doc, key, &project).await?;
        Ok(())
    }

    async fn update_project(
        &self,
        doc: &mut SyncDocument,
        key: &str,
        entry: &ProjectEntry,
        project: Project,
        parent: Option<&Project>,
    ) -> Result<Project, SyncError> {
        let (mut changes, mut update) = diff_project(&project, entry);
        let parent_id = parent.map(|p| p.id);
        if project.parent_id != parent_id {
            update.parent_id = Some(parent_id);
            changes.push("parent");
        }

        if changes.is_empty() {
            tracing::debug!(uuid = %key, "Nothing to update in project details");
            return Ok(project);
        }

        let updated = self.store.update_project(project.id, &update).await?;
        if let Some(target) = doc.projects.get_mut(key) {
            target.status = Some(EntityStatus::Updated);
        }
        self.publish(
            updated.uuid,
            EVENT_REMOTE_PROJECT_UPDATE,
            format!("update project from remote site {{site}} ({})", changes.joined()),
            None,
        );

        let mut fields = changes.names().to_vec();
        fields.sort_unstable();
        tracing::info!(
            kind = updated.project_type.label(),
            uuid = %key,
            fields = %fields.join(", "),
            "Updated project"
        );
        Ok(updated)
    }

    /// Create the project, or record a title conflict and return `None`.
    async fn create_project(
        &self,
        doc: &mut SyncDocument,
        key: &str,
        uuid: Uuid,
        entry: &ProjectEntry,
        parent: Option<&Project>,
    ) -> Result<Option<Project>, SyncError> {
        let parent_id = parent.map(|p| p.id);
        if let Some(existing) = self.store.find_project_by_title(parent_id, &entry.title).await? {
            let msg = format!(
                "{}, unable to create",
                duplicate_title_message(existing.project_type, &existing.title)
            );
            project_error(doc, key, entry, "create", msg);
            return Ok(None);
        }

        let project = self
            .store
            .create_project(&CreateProject {
                uuid: Some(uuid),
                title: entry.title.clone(),
                project_type: entry.project_type,
                parent_id,
                description: entry.description.clone(),
                readme: entry.readme.clone().unwrap_or_default(),
            })
            .await?;

        if let Some(target) = doc.projects.get_mut(key) {
            target.status = Some(EntityStatus::Created);
        }
        self.publish(
            project.uuid,
            EVENT_REMOTE_PROJECT_CREATE,
            "create project from remote site {site}".to_string(),
            None,
        );
        tracing::info!(kind = project.project_type.label(), uuid = %key, "Created project");
        Ok(Some(project))
    }

    // ---- Roles ----

    async fn update_roles(
        &self,
        doc: &mut SyncDocument,
        key: &str,
        project: &Project,
        entry: &ProjectEntry,
    ) -> Result<(), SyncError> {
        let Some(roles) = &entry.roles else {
            return Ok(());
        };

        for (role_key, role_entry) in roles {
            if role_entry.status == Some(EntityStatus::Deleted) {
                continue;
            }
            let outcome = self.sync_role(project, role_key, role_entry).await?;
            let target = doc
                .projects
                .get_mut(key)
                .and_then(|p| p.roles.as_mut())
                .and_then(|r| r.get_mut(role_key));
            if let Some(target) = target {
                outcome.apply(target);
            }
        }
        Ok(())
    }

    async fn sync_role(
        &self,
        project: &Project,
        role_key: &str,
        entry: &RoleEntry,
    ) -> Result<RoleOutcome, SyncError> {
        let Some(role) = self.store.find_role_by_name(&entry.role).await? else {
            return Ok(RoleOutcome::error(format!(
                "Role object \"{}\" not found (assignment {})",
                entry.role, role_key
            )));
        };

        let federated = is_federated(&entry.user);
        let is_owner = role.name == ROLE_OWNER;
        let local_user = if federated {
            None
        } else {
            self.store.find_user_by_username(&entry.user).await?
        };

        if !federated && !is_owner {
            if !self.allow_local {
                return Ok(RoleOutcome::error(format!(
                    "Local user \"{}\" set for role \"{}\" but local users are not allowed",
                    entry.user, entry.role
                )));
            }
            if local_user.is_none() {
                return Ok(RoleOutcome::error(format!(
                    "Local user \"{}\" not found, role of \"{}\" will not be assigned",
                    entry.user, entry.role
                )));
            }
        }

        let mut outcome = RoleOutcome::default();
        let role_user = if is_owner && !federated && (!self.allow_local || local_user.is_none()) {
            let admin = &self.default_admin.username;
            if &entry.user != admin {
                let msg = format!(
                    "Non-federated user \"{}\" set as owner, assigning role to user \"{}\"",
                    entry.user, admin
                );
                tracing::info!("{msg}");
                outcome.user = Some(admin.clone());
                outcome.status_msg = Some(msg);
            }
            self.default_admin.clone()
        } else if let Some(user) = local_user {
            user
        } else {
            match self.store.find_user_by_username(&entry.user).await? {
                Some(user) => user,
                None => {
                    return Ok(RoleOutcome::error(format!(
                        "User \"{}\" not found, role of \"{}\" will not be assigned",
                        entry.user, entry.role
                    )))
                }
            }
        };

        let previous = if is_owner {
            self.store.project_owner(project.id).await?
        } else {
            self.store.find_assignment(project.id, role_user.id).await?
        };

        match previous {
            Some(old) if is_owner && old.user_id == role_user.id => {}
            Some(old) if !is_owner && old.role_id == role.id => {}
            Some(old) => {
                if is_owner {
                    self.release_user(project, &role_user).await?;
                }
                self.store
                    .update_assignment(
                        old.id,
                        &UpdateRoleAssignment {
                            user_id: role_user.id,
                            role_id: role.id,
                        },
                    )
                    .await?;
                outcome.status = Some(EntityStatus::Updated);
                self.publish(
                    project.uuid,
                    EVENT_REMOTE_ROLE_UPDATE,
                    format!("update role to \"{}\" for {{user}} from site {{site}}", role.name),
                    Some(&role_user.username),
                );
                tracing::info!(
                    assignment = %role_key,
                    username = %role_user.username,
                    role = %role.name,
                    "Updated role"
                );
            }
            None => {
                if is_owner {
                    self.release_user(project, &role_user).await?;
                }
                self.store
                    .create_assignment(&CreateRoleAssignment {
                        uuid: Uuid::parse_str(role_key).ok(),
                        project_id: project.id,
                        user_id: role_user.id,
                        role_id: role.id,
                    })
                    .await?;
                outcome.status = Some(EntityStatus::Created);
                self.publish(
                    project.uuid,
                    EVENT_REMOTE_ROLE_CREATE,
                    format!("add role \"{}\" for {{user}} from site {{site}}", role.name),
                    Some(&role_user.username),
                );
                tracing::info!(
                    assignment = %role_key,
                    username = %role_user.username,
                    role = %role.name,
                    "Created role"
                );
            }
        }
        Ok(outcome)
    }

    /// Drop the user's current role on the project before making them owner.
    async fn release_user(&self, project: &Project, user: &User) -> Result<(), SyncError> {
        match self.store.find_assignment(project.id, user.id).await? {
            Some(existing) => {
                self.store.delete_assignment(existing.id).await?;
                tracing::debug!(username = %user.username, "Deleted existing role from user");
            }
            None => {
                tracing::debug!(username = %user.username, "No existing role found for user");
            }
        }
        Ok(())
    }

    /// Delete non-owner assignments whose user is absent from the roster.
    async fn remove_deleted_roles(
        &self,
        doc: &mut SyncDocument,
        key: &str,
        project: &Project,
    ) -> Result<(), SyncError> {
        let current_users: HashSet<String> = doc
            .projects
            .get(key)
            .and_then(|p| p.roles.as_ref())
            .map(|roles| {
                roles
                    .values()
                    .filter(|r| r.status != Some(EntityStatus::Deleted))
                    .map(|r| r.user.clone())
                    .collect()
            })
            .unwrap_or_default();

        let stale: Vec<_> = self
            .store
            .project_assignments(project.id)
            .await?
            .into_iter()
            .filter(|a| a.role_name != ROLE_OWNER && !current_users.contains(&a.username))
            .collect();
        if stale.is_empty() {
            return Ok(());
        }

        for assignment in &stale {
            self.store.delete_assignment(assignment.id).await?;

            let mut removed = RoleEntry::new(&assignment.username, &assignment.role_name);
            removed.status = Some(EntityStatus::Deleted);
            if let Some(target) = doc.projects.get_mut(key) {
                target
                    .roles
                    .get_or_insert_with(IndexMap::new)
                    .insert(assignment.uuid.to_string(), removed);
            }

            self.publish(
                project.uuid,
                EVENT_REMOTE_ROLE_DELETE,
                format!("remove role \"{}\" from {{user}} by site {{site}}", assignment.role_name),
                Some(&assignment.username),
            );
        }

        let mut usernames: Vec<&str> = stale.iter().map(|a| a.username.as_str()).collect();
        usernames.sort_unstable();
        tracing::info!(
            count = stale.len(),
            users = %usernames.join(", "),
            "Deleted removed roles"
        );
        Ok(())
    }

    fn publish(&self, project_uuid: Uuid, event_name: &str, description: String, user: Option<&str>) {
        let Some(bus) = self.events else {
            return;
        };
        let mut event = TimelineEvent::new(Some(project_uuid), event_name, description)
            .with_user(Some(self.actor.as_str()));
        if let Some(username) = user {
            event = event.with_object("user", username);
        }
        bus.publish(event.with_object("site", &self.site.name));
    }
}

/// Mark a project entry as failed and log it.
fn project_error(doc: &mut SyncDocument, key: &str, entry: &ProjectEntry, action: &str, msg: String) {
    tracing::error!(
        action,
        kind = entry.project_type.label(),
        title = %entry.title,
        uuid = %key,
        "{msg}"
    );
    if let Some(target) = doc.projects.get_mut(key) {
        target.set_error(msg);
    }
}
