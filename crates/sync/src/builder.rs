//! Source side: build the document a target site is allowed to see.

use std::collections::HashSet;

use indexmap::IndexMap;
use roster_core::remote::RemoteLevel;
use roster_core::project::ProjectType;
use roster_core::roles::ROLE_OWNER;
use roster_core::types::DbId;
use roster_db::models::project::Project;
use roster_db::models::remote::RemoteSite;
use roster_db::models::user::User;
use roster_db::ProjectRoleStore;

use crate::document::{ProjectEntry, RoleEntry, SyncDocument, UserEntry};
use crate::error::SyncError;
use crate::RemoteProjectApi;

/// Accumulates entries while walking a site's grants.
struct DocumentBuilder<'a> {
    store: &'a dyn ProjectRoleStore,
    doc: SyncDocument,
    usernames: HashSet<String>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(store: &'a dyn ProjectRoleStore) -> Self {
        Self {
            store,
            doc: SyncDocument::default(),
            usernames: HashSet::new(),
        }
    }

    /// Register a user once per document, keyed by its UUID.
    async fn add_user(&mut self, user: &User) -> Result<(), SyncError> {
        if !self.usernames.insert(user.username.clone()) {
            return Ok(());
        }
        let groups = self.store.user_groups(user.id).await?;
        self.doc.users.insert(
            user.uuid.to_string(),
            UserEntry {
                username: user.username.clone(),
                name: user.display_name(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                email: user.email.clone(),
                groups,
                status: None,
            },
        );
        Ok(())
    }

    async fn add_user_by_id(&mut self, user_id: DbId) -> Result<(), SyncError> {
        if let Some(user) = self.store.find_user_by_id(user_id).await? {
            self.add_user(&user).await?;
        }
        Ok(())
    }

    /// Info-level entry: title, type, description, readme and parent.
    async fn info_entry(&self, project: &Project, level: RemoteLevel) -> Result<ProjectEntry, SyncError> {
        let parent_uuid = match project.parent_id {
            Some(id) => self
                .store
                .find_project_by_id(id)
                .await?
                .map(|p| p.uuid.to_string()),
            None => None,
        };
        let mut entry = ProjectEntry::new(&project.title, project.project_type, level);
        entry.description = Some(project.description.clone().unwrap_or_default());
        entry.readme = Some(project.readme.clone());
        entry.parent_uuid = Some(parent_uuid);
        Ok(entry)
    }

    /// Ensure every ancestor of `project` is in the document, root first.
    ///
    /// At `READ_ROLES` each ancestor carries its owner assignment.
    async fn add_ancestors(&mut self, project: &Project, level: RemoteLevel) -> Result<(), SyncError> {
        let with_owner = level == RemoteLevel::ReadRoles;
        let ancestors = self.store.project_ancestors(project).await?;

        for ancestor in &ancestors {
            let key = ancestor.uuid.to_string();
            let wanted = if with_owner {
                RemoteLevel::ReadRoles
            } else {
                RemoteLevel::ReadInfo
            };

            let current = self.doc.projects.get(&key).map(|e| e.level);
            match current {
                Some(existing) if existing >= wanted => continue,
                Some(RemoteLevel::ReadInfo) => {
                    // Escalate in place to keep the entry's position.
                    if let Some(entry) = self.doc.projects.get_mut(&key) {
                        entry.level = wanted;
                    }
                }
                _ => {
                    let entry = self.info_entry(ancestor, wanted).await?;
                    self.doc.projects.insert(key.clone(), entry);
                }
            }

            if with_owner {
                self.add_owner_role(ancestor, &key).await?;
            }
        }
        Ok(())
    }

    async fn add_owner_role(&mut self, category: &Project, key: &str) -> Result<(), SyncError> {
        let owner = self.store.project_owner(category.id).await?;
        let roles = self
            .doc
            .projects
            .get_mut(key)
            .map(|entry| entry.roles.get_or_insert_with(IndexMap::new));
        if let (Some(roles), Some(owner)) = (roles, &owner) {
            roles.insert(
                owner.uuid.to_string(),
                RoleEntry::new(&owner.username, ROLE_OWNER),
            );
        }
        if let Some(owner) = owner {
            self.add_user_by_id(owner.user_id).await?;
        }
        Ok(())
    }

    /// Insert a directly granted entry unless a richer one is already there.
    fn put_granted(&mut self, key: String, entry: ProjectEntry) {
        match self.doc.projects.get(&key) {
            Some(existing) if existing.level > entry.level => {}
            _ => {
                self.doc.projects.insert(key, entry);
            }
        }
    }
}

impl RemoteProjectApi<'_> {
    /// Build the sync document for a target site from its grants.
    pub async fn get_target_data(&self, site: &RemoteSite) -> Result<SyncDocument, SyncError> {
        let mut builder = DocumentBuilder::new(self.store);
        let grants = self.store.site_remote_projects(site.id).await?;

        for grant in grants {
            let key = grant.project_uuid.to_string();
            let project = self.store.remote_project_local(&grant).await?;

            match (grant.level, project) {
                (RemoteLevel::None, _) => {}
                (RemoteLevel::ViewAvail, project) => {
                    let mut entry = match &project {
                        Some(p) => ProjectEntry::new(&p.title, p.project_type, grant.level),
                        None => ProjectEntry::new("", ProjectType::Project, grant.level),
                    };
                    entry.available = Some(project.is_some());
                    builder.put_granted(key, entry);
                }
                (level, None) => {
                    tracing::warn!(
                        site = %site.name,
                        project = %grant.project_uuid,
                        level = %level,
                        "Granted project not found locally, skipping"
                    );
                }
                (level, Some(project)) => {
                    builder.add_ancestors(&project, level).await?;
                    let mut entry = builder.info_entry(&project, level).await?;

                    if level.includes_roles() {
                        let mut roles = IndexMap::new();
                        for assignment in self.store.project_assignments(project.id).await? {
                            roles.insert(
                                assignment.uuid.to_string(),
                                RoleEntry::new(&assignment.username, &assignment.role_name),
                            );
                            builder.add_user_by_id(assignment.user_id).await?;
                        }
                        entry.roles = Some(roles);
                    }
                    builder.put_granted(key, entry);
                }
            }
        }

        tracing::debug!(
            site = %site.name,
            users = builder.doc.users.len(),
            projects = builder.doc.projects.len(),
            "Built sync document"
        );
        Ok(builder.doc)
    }
}
