#![allow(dead_code)]

use indexmap::IndexMap;
use roster_core::project::ProjectType;
use roster_core::remote::{RemoteLevel, SiteMode};
use roster_core::settings::ProjectRolesSettings;
use roster_core::types::DbId;
use roster_db::models::project::{CreateProject, Project};
use roster_db::models::remote::{CreateRemoteSite, RemoteSite, UpsertRemoteProject};
use roster_db::models::role::CreateRoleAssignment;
use roster_db::models::user::{CreateUser, User};
use roster_db::{MemoryStore, ProjectRoleStore};
use roster_sync::{ProjectEntry, RoleEntry, SyncDocument, UserEntry};
use uuid::Uuid;

pub const CATEGORY_UUID: &str = "2b7e9c55-4a8e-4d3c-9f4b-1c0de8a3b001";
pub const PROJECT_UUID: &str = "2b7e9c55-4a8e-4d3c-9f4b-1c0de8a3b002";
pub const ALICE_UUID: &str = "7f1d0a9e-3c3b-4b8e-8a51-0d6e5c4b2a01";
pub const BOB_UUID: &str = "7f1d0a9e-3c3b-4b8e-8a51-0d6e5c4b2a02";
pub const CATEGORY_OWNER_UUID: &str = "c4e8a1f2-5b6d-4e7f-8091-a2b3c4d5e601";
pub const PROJECT_OWNER_UUID: &str = "c4e8a1f2-5b6d-4e7f-8091-a2b3c4d5e602";
pub const PROJECT_GUEST_UUID: &str = "c4e8a1f2-5b6d-4e7f-8091-a2b3c4d5e603";

pub const ALICE: &str = "alice@EXAMPLE";
pub const BOB: &str = "bob@EXAMPLE";
pub const ADMIN: &str = "admin";

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

pub fn target_settings(allow_local_users: bool) -> ProjectRolesSettings {
    ProjectRolesSettings {
        site_mode: SiteMode::Target,
        allow_local_users,
        ..Default::default()
    }
}

/// A `TARGET` deployment with the default admin and a registered source.
pub async fn target_store(allow_local_users: bool) -> (MemoryStore, RemoteSite) {
    let store = MemoryStore::new(target_settings(allow_local_users));
    create_user(&store, ADMIN).await;
    let site = create_site(&store, "Source", SiteMode::Source).await;
    (store, site)
}

/// A `SOURCE` deployment with one registered target.
pub async fn source_store() -> (MemoryStore, RemoteSite) {
    let store = MemoryStore::default();
    let site = create_site(&store, "Target", SiteMode::Target).await;
    (store, site)
}

pub async fn create_site(store: &MemoryStore, name: &str, mode: SiteMode) -> RemoteSite {
    store
        .create_remote_site(&CreateRemoteSite {
            name: name.to_string(),
            url: format!("https://{}.example.org/", name.to_lowercase()),
            mode: mode.to_string(),
            description: String::new(),
            secret: None,
        })
        .await
        .unwrap()
}

pub async fn create_user(store: &MemoryStore, username: &str) -> User {
    store
        .create_user(&CreateUser {
            username: username.to_string(),
            name: format!("{username} name"),
            email: format!("{}@mail.example.org", username.replace('@', ".")),
            ..Default::default()
        })
        .await
        .unwrap()
}

pub async fn create_project(
    store: &MemoryStore,
    title: &str,
    project_type: ProjectType,
    parent: Option<&Project>,
) -> Project {
    store
        .create_project(&CreateProject {
            uuid: None,
            title: title.to_string(),
            project_type,
            parent_id: parent.map(|p| p.id),
            description: Some(format!("{title} description")),
            readme: format!("# {title}"),
        })
        .await
        .unwrap()
}

pub async fn assign(store: &MemoryStore, project: &Project, user: &User, role: &str) {
    let role_id = store.find_role_by_name(role).await.unwrap().unwrap().id;
    store
        .create_assignment(&CreateRoleAssignment {
            uuid: None,
            project_id: project.id,
            user_id: user.id,
            role_id,
        })
        .await
        .unwrap();
}

pub async fn grant(store: &MemoryStore, site: &RemoteSite, project: &Project, level: RemoteLevel) {
    store
        .upsert_remote_project(&UpsertRemoteProject {
            site_id: site.id,
            project_uuid: project.uuid,
            project_id: Some(project.id),
            level,
        })
        .await
        .unwrap();
}

pub async fn project_by_key(store: &MemoryStore, key: &str) -> Option<Project> {
    store
        .find_project_by_uuid(Uuid::parse_str(key).unwrap())
        .await
        .unwrap()
}

/// `(username, role)` pairs on a project, sorted.
pub async fn roster(store: &MemoryStore, project_id: DbId) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = store
        .project_assignments(project_id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| (a.username, a.role_name))
        .collect();
    pairs.sort();
    pairs
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

pub fn user_entry(username: &str, group: &str) -> UserEntry {
    UserEntry {
        username: username.to_string(),
        name: format!("{username} name"),
        first_name: "First".to_string(),
        last_name: "Last".to_string(),
        email: format!("{}@mail.example.org", username.replace('@', ".")),
        groups: vec![group.to_string()],
        status: None,
    }
}

pub fn info_entry(title: &str, project_type: ProjectType, level: RemoteLevel, parent: Option<&str>) -> ProjectEntry {
    let mut entry = ProjectEntry::new(title, project_type, level);
    entry.description = Some(format!("{title} description"));
    entry.readme = Some(format!("# {title}"));
    entry.parent_uuid = Some(parent.map(str::to_string));
    entry
}

pub fn roles(entries: &[(&str, &str, &str)]) -> Option<IndexMap<String, RoleEntry>> {
    Some(
        entries
            .iter()
            .map(|(key, user, role)| (key.to_string(), RoleEntry::new(*user, *role)))
            .collect(),
    )
}

/// Category `C` and its project `P`, both owned by alice at `READ_ROLES`.
pub fn category_and_project_doc() -> SyncDocument {
    let mut doc = SyncDocument::default();
    doc.users.insert(ALICE_UUID.to_string(), user_entry(ALICE, "example"));

    let mut category = info_entry("Category", ProjectType::Category, RemoteLevel::ReadRoles, None);
    category.roles = roles(&[(CATEGORY_OWNER_UUID, ALICE, "owner")]);
    doc.projects.insert(CATEGORY_UUID.to_string(), category);

    let mut project = info_entry(
        "Project",
        ProjectType::Project,
        RemoteLevel::ReadRoles,
        Some(CATEGORY_UUID),
    );
    project.roles = roles(&[(PROJECT_OWNER_UUID, ALICE, "owner")]);
    doc.projects.insert(PROJECT_UUID.to_string(), project);
    doc
}
