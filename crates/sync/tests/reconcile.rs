mod common;

use assert_matches::assert_matches;
use common::*;
use roster_core::error::CoreError;
use roster_core::project::ProjectType;
use roster_core::remote::{RemoteLevel, SiteMode};
use roster_core::roles::{ROLE_CONTRIBUTOR, ROLE_DELEGATE, ROLE_GUEST, ROLE_OWNER};
use roster_db::models::remote::RemoteSite;
use roster_db::models::role::CreateRoleAssignment;
use roster_db::{MemoryStore, ProjectRoleStore, StoreError};
use roster_events::{
    EventBus, EVENT_REMOTE_PROJECT_CREATE, EVENT_REMOTE_PROJECT_UPDATE, EVENT_REMOTE_ROLE_CREATE,
    EVENT_REMOTE_ROLE_DELETE, EVENT_REMOTE_ROLE_UPDATE,
};
use roster_sync::{EntityStatus, RemoteProjectApi, RoleEntry, SyncDocument, SyncError};

async fn sync(store: &MemoryStore, site: &RemoteSite, doc: &SyncDocument) -> SyncDocument {
    RemoteProjectApi::new(store)
        .sync_source_data(site, doc.clone(), None)
        .await
        .unwrap()
}

fn role_status(doc: &SyncDocument, project: &str, role: &str) -> Option<EntityStatus> {
    doc.projects[project].roles.as_ref().unwrap()[role].status
}

// ---------------------------------------------------------------------------
// Category and project scenario
// ---------------------------------------------------------------------------

#[tokio::test]
async fn creates_category_project_roles_and_user() {
    let (store, site) = target_store(false).await;
    let doc = category_and_project_doc();

    let out = sync(&store, &site, &doc).await;

    assert_eq!(store.project_count().await, 2);
    assert_eq!(store.assignment_count().await, 2);

    let category = project_by_key(&store, CATEGORY_UUID).await.unwrap();
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(category.project_type, ProjectType::Category);
    assert_eq!(project.parent_id, Some(category.id));
    assert_eq!(project.readme, "# Project");
    for p in [&category, &project] {
        assert_eq!(roster(&store, p.id).await, [(ALICE.to_string(), ROLE_OWNER.to_string())]);
    }

    let grants = store.site_remote_projects(site.id).await.unwrap();
    assert_eq!(grants.len(), 2);
    assert!(grants.iter().all(|g| g.level == RemoteLevel::ReadRoles));
    assert!(grants.iter().all(|g| g.date_access.is_some()));

    let alice = store.find_user_by_username(ALICE).await.unwrap().unwrap();
    assert_eq!(alice.uuid.to_string(), ALICE_UUID);
    assert_eq!(store.user_groups(alice.id).await.unwrap(), ["example"]);

    assert_eq!(out.users[ALICE_UUID].status, Some(EntityStatus::Created));
    assert_eq!(out.projects[CATEGORY_UUID].status, Some(EntityStatus::Created));
    assert_eq!(out.projects[PROJECT_UUID].status, Some(EntityStatus::Created));
    assert_eq!(
        role_status(&out, CATEGORY_UUID, CATEGORY_OWNER_UUID),
        Some(EntityStatus::Created)
    );
    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_OWNER_UUID),
        Some(EntityStatus::Created)
    );

    // Assignment UUIDs are preserved from the source.
    let owner = store.project_owner(project.id).await.unwrap().unwrap();
    assert_eq!(owner.uuid.to_string(), PROJECT_OWNER_UUID);
}

#[tokio::test]
async fn second_run_changes_nothing() {
    let (store, site) = target_store(false).await;
    let doc = category_and_project_doc();
    sync(&store, &site, &doc).await;
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();

    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let out = RemoteProjectApi::new(&store)
        .with_events(&bus)
        .sync_source_data(&site, doc.clone(), None)
        .await
        .unwrap();

    assert_eq!(out, doc);
    assert!(!out.has_status());
    assert_eq!(store.project_count().await, 2);
    assert_eq!(store.assignment_count().await, 2);
    assert_eq!(store.user_count().await, 2);
    assert_eq!(
        project_by_key(&store, PROJECT_UUID).await.unwrap().updated_at,
        project.updated_at
    );
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn parent_order_does_not_depend_on_document_order() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    doc.projects.reverse();
    assert_eq!(doc.projects.get_index(0).unwrap().0, PROJECT_UUID);

    let out = sync(&store, &site, &doc).await;

    assert_eq!(out.projects[PROJECT_UUID].status, Some(EntityStatus::Created));
    assert_eq!(out.projects[CATEGORY_UUID].status, Some(EntityStatus::Created));
    assert_eq!(store.project_count().await, 2);
}

// ---------------------------------------------------------------------------
// Gating and fatal preconditions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn below_read_roles_nothing_materializes() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    for (_, entry) in doc.projects.iter_mut() {
        entry.level = RemoteLevel::ReadInfo;
    }
    doc.projects[CATEGORY_UUID].level = RemoteLevel::ViewAvail;

    let out = sync(&store, &site, &doc).await;

    assert_eq!(out, doc);
    assert_eq!(store.project_count().await, 0);
    assert_eq!(store.assignment_count().await, 0);
    assert!(store.find_user_by_username(ALICE).await.unwrap().is_none());
    assert!(store.site_remote_projects(site.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn read_info_parent_is_not_created_for_read_roles_child() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    doc.projects[CATEGORY_UUID].level = RemoteLevel::ReadInfo;

    let out = sync(&store, &site, &doc).await;

    assert_eq!(store.project_count().await, 0);
    let project = &out.projects[PROJECT_UUID];
    assert_eq!(project.status, Some(EntityStatus::Error));
    assert_eq!(
        project.status_msg.as_deref(),
        Some(format!("Parent {CATEGORY_UUID} not found").as_str())
    );
    assert_eq!(out.projects[CATEGORY_UUID].status, None);
}

#[tokio::test]
async fn existing_project_with_unknown_parent_is_left_alone() {
    let (store, site) = target_store(false).await;
    sync(&store, &site, &category_and_project_doc()).await;
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    let roster = store.project_assignments(project.id).await.unwrap();

    let unknown = "0a0b0c0d-0000-4000-8000-00000000beef";
    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID].parent_uuid = Some(Some(unknown.to_string()));
    doc.projects[PROJECT_UUID].title = "Renamed".to_string();
    let out = sync(&store, &site, &doc).await;

    let entry = &out.projects[PROJECT_UUID];
    assert_eq!(entry.status, Some(EntityStatus::Error));
    assert_eq!(
        entry.status_msg.as_deref(),
        Some(format!("Parent {unknown} not found").as_str())
    );
    assert!(entry
        .roles
        .as_ref()
        .unwrap()
        .values()
        .all(|r| r.status.is_none()));

    let unchanged = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(unchanged.title, project.title);
    assert_eq!(unchanged.parent_id, project.parent_id);
    assert_eq!(store.project_assignments(project.id).await.unwrap(), roster);
}

#[tokio::test]
async fn missing_default_admin_aborts_before_changes() {
    let store = MemoryStore::new(target_settings(false));
    let site = create_site(&store, "Source", SiteMode::Source).await;

    let err = RemoteProjectApi::new(&store)
        .sync_source_data(&site, category_and_project_doc(), None)
        .await
        .unwrap_err();

    assert_matches!(err, SyncError::DefaultAdminNotFound(ref name) if name == ADMIN);
    assert_eq!(store.user_count().await, 0);
    assert_eq!(store.project_count().await, 0);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn federated_users_are_updated_and_local_users_ignored() {
    let (store, site) = target_store(false).await;
    let alice = create_user(&store, ALICE).await;
    store.add_user_to_group(alice.id, "stale").await.unwrap();

    let mut doc = category_and_project_doc();
    doc.users.insert(BOB_UUID.to_string(), user_entry("bob", "example"));

    let out = sync(&store, &site, &doc).await;

    assert_eq!(out.users[ALICE_UUID].status, Some(EntityStatus::Updated));
    assert_eq!(out.users[BOB_UUID].status, None);
    assert!(store.find_user_by_username("bob").await.unwrap().is_none());

    let alice = store.find_user_by_username(ALICE).await.unwrap().unwrap();
    assert_eq!(alice.first_name, "First");
    assert_eq!(alice.last_name, "Last");
    assert_eq!(store.user_groups(alice.id).await.unwrap(), ["example"]);
}

#[tokio::test]
async fn group_change_alone_marks_user_updated() {
    let (store, site) = target_store(false).await;
    sync(&store, &site, &category_and_project_doc()).await;

    let mut doc = category_and_project_doc();
    doc.users[ALICE_UUID].groups.push("extra".to_string());
    let out = sync(&store, &site, &doc).await;

    assert_eq!(out.users[ALICE_UUID].status, Some(EntityStatus::Updated));
    let alice = store.find_user_by_username(ALICE).await.unwrap().unwrap();
    assert_eq!(store.user_groups(alice.id).await.unwrap(), ["example", "extra"]);
}

#[tokio::test]
async fn new_federated_user_joins_domain_group() {
    let (store, site) = target_store(false).await;

    let mut doc = category_and_project_doc();
    let mut dave = user_entry("dave@lab", "example");
    dave.groups.clear();
    doc.users.insert(BOB_UUID.to_string(), dave);
    let out = sync(&store, &site, &doc).await;

    assert_eq!(out.users[BOB_UUID].status, Some(EntityStatus::Created));
    let dave = store.find_user_by_username("dave@lab").await.unwrap().unwrap();
    assert_eq!(dave.username, "dave@LAB");
    assert_eq!(store.user_groups(dave.id).await.unwrap(), ["lab"]);

    // The domain group is kept on the next run.
    let again = sync(&store, &site, &doc).await;
    assert_eq!(again.users[BOB_UUID].status, None);
    assert_eq!(store.user_groups(dave.id).await.unwrap(), ["lab"]);
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn changed_fields_update_project_and_publish_event() {
    let (store, site) = target_store(false).await;
    sync(&store, &site, &category_and_project_doc()).await;

    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID].title = "Renamed".to_string();
    doc.projects[PROJECT_UUID].readme = Some("# New readme".to_string());

    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let out = RemoteProjectApi::new(&store)
        .with_events(&bus)
        .sync_source_data(&site, doc, Some("syncer"))
        .await
        .unwrap();

    assert_eq!(out.projects[PROJECT_UUID].status, Some(EntityStatus::Updated));
    assert_eq!(out.projects[CATEGORY_UUID].status, None);

    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(project.title, "Renamed");
    assert_eq!(project.readme, "# New readme");

    let event = rx.try_recv().unwrap();
    assert_eq!(event.event_name, EVENT_REMOTE_PROJECT_UPDATE);
    assert_eq!(event.project_uuid, Some(project.uuid));
    assert_eq!(event.user.as_deref(), Some("syncer"));
    assert!(event.description.contains("title, readme"));
    assert!(event.objects.iter().any(|o| o.label == "site" && o.name == site.name));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn moved_project_gets_new_parent() {
    let (store, site) = target_store(false).await;
    sync(&store, &site, &category_and_project_doc()).await;

    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID].parent_uuid = Some(None);
    let out = sync(&store, &site, &doc).await;

    assert_eq!(out.projects[PROJECT_UUID].status, Some(EntityStatus::Updated));
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(project.parent_id, None);
}

#[tokio::test]
async fn title_conflict_skips_the_subtree() {
    let (store, site) = target_store(false).await;
    create_project(&store, "Category", ProjectType::Category, None).await;

    let out = sync(&store, &site, &category_and_project_doc()).await;

    let category = &out.projects[CATEGORY_UUID];
    assert_eq!(category.status, Some(EntityStatus::Error));
    assert_eq!(
        category.status_msg.as_deref(),
        Some("Category with the title \"Category\" exists under the same parent, unable to create")
    );
    let project = &out.projects[PROJECT_UUID];
    assert_eq!(project.status, Some(EntityStatus::Error));
    assert!(project.status_msg.as_deref().unwrap().starts_with("Parent "));

    assert_eq!(store.project_count().await, 1);
    assert_eq!(store.assignment_count().await, 0);
    // The user phase is unaffected.
    assert_eq!(out.users[ALICE_UUID].status, Some(EntityStatus::Created));
}

#[tokio::test]
async fn type_mismatch_is_reported() {
    let (store, site) = target_store(false).await;
    sync(&store, &site, &category_and_project_doc()).await;

    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID].project_type = ProjectType::Category;
    let out = sync(&store, &site, &doc).await;

    let project = &out.projects[PROJECT_UUID];
    assert_eq!(project.status, Some(EntityStatus::Error));
    assert_eq!(
        project.status_msg.as_deref(),
        Some("Local project with the same UUID has a different type")
    );
}

#[tokio::test]
async fn invalid_project_key_is_reported() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    let entry = doc.projects.shift_remove(CATEGORY_UUID).unwrap();
    doc.projects.insert("not-a-uuid".to_string(), entry);

    let out = sync(&store, &site, &doc).await;

    assert_eq!(out.projects["not-a-uuid"].status, Some(EntityStatus::Error));
    assert_eq!(store.project_count().await, 0);
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[tokio::test]
async fn owner_change_keeps_a_single_owner() {
    let (store, site) = target_store(false).await;
    sync(&store, &site, &category_and_project_doc()).await;

    let mut doc = category_and_project_doc();
    doc.users.insert(BOB_UUID.to_string(), user_entry(BOB, "example"));
    doc.projects[PROJECT_UUID].roles = roles(&[
        (PROJECT_OWNER_UUID, BOB, ROLE_OWNER),
        (PROJECT_GUEST_UUID, ALICE, ROLE_GUEST),
    ]);

    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let out = RemoteProjectApi::new(&store)
        .with_events(&bus)
        .sync_source_data(&site, doc, None)
        .await
        .unwrap();

    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_OWNER_UUID),
        Some(EntityStatus::Updated)
    );
    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_GUEST_UUID),
        Some(EntityStatus::Created)
    );

    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(
        roster(&store, project.id).await,
        [
            (ALICE.to_string(), ROLE_GUEST.to_string()),
            (BOB.to_string(), ROLE_OWNER.to_string()),
        ]
    );
    let owners = store
        .project_assignments(project.id)
        .await
        .unwrap()
        .into_iter()
        .filter(|a| a.role_name == ROLE_OWNER)
        .count();
    assert_eq!(owners, 1);

    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.event_name);
    }
    assert!(names.contains(&EVENT_REMOTE_ROLE_UPDATE.to_string()));
    assert!(names.contains(&EVENT_REMOTE_ROLE_CREATE.to_string()));
}

#[tokio::test]
async fn new_owner_loses_previous_role() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    doc.users.insert(BOB_UUID.to_string(), user_entry(BOB, "example"));
    doc.projects[PROJECT_UUID].roles = roles(&[
        (PROJECT_OWNER_UUID, ALICE, ROLE_OWNER),
        (PROJECT_GUEST_UUID, BOB, ROLE_CONTRIBUTOR),
    ]);
    sync(&store, &site, &doc).await;

    // Bob takes over; alice is gone from the roster.
    doc.projects[PROJECT_UUID].roles = roles(&[(PROJECT_OWNER_UUID, BOB, ROLE_OWNER)]);
    let out = sync(&store, &site, &doc).await;

    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(roster(&store, project.id).await, [(BOB.to_string(), ROLE_OWNER.to_string())]);
    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_OWNER_UUID),
        Some(EntityStatus::Updated)
    );
}

#[tokio::test]
async fn non_owner_role_change_updates_in_place() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    doc.users.insert(BOB_UUID.to_string(), user_entry(BOB, "example"));
    doc.projects[PROJECT_UUID].roles = roles(&[
        (PROJECT_OWNER_UUID, ALICE, ROLE_OWNER),
        (PROJECT_GUEST_UUID, BOB, ROLE_GUEST),
    ]);
    sync(&store, &site, &doc).await;

    doc.projects[PROJECT_UUID].roles = roles(&[
        (PROJECT_OWNER_UUID, ALICE, ROLE_OWNER),
        (PROJECT_GUEST_UUID, BOB, ROLE_CONTRIBUTOR),
    ]);
    let out = sync(&store, &site, &doc).await;

    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_GUEST_UUID),
        Some(EntityStatus::Updated)
    );
    assert_eq!(role_status(&out, PROJECT_UUID, PROJECT_OWNER_UUID), None);
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(
        roster(&store, project.id).await,
        [
            (ALICE.to_string(), ROLE_OWNER.to_string()),
            (BOB.to_string(), ROLE_CONTRIBUTOR.to_string()),
        ]
    );
}

#[tokio::test]
async fn roles_missing_from_roster_are_deleted() {
    let (store, site) = target_store(false).await;
    let doc = category_and_project_doc();
    sync(&store, &site, &doc).await;

    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    let bob = create_user(&store, BOB).await;
    assign(&store, &project, &bob, ROLE_CONTRIBUTOR).await;
    let stale = store.find_assignment(project.id, bob.id).await.unwrap().unwrap();

    let bus = EventBus::default();
    let mut rx = bus.subscribe();
    let out = RemoteProjectApi::new(&store)
        .with_events(&bus)
        .sync_source_data(&site, doc, None)
        .await
        .unwrap();

    assert_eq!(roster(&store, project.id).await, [(ALICE.to_string(), ROLE_OWNER.to_string())]);
    let roles = out.projects[PROJECT_UUID].roles.as_ref().unwrap();
    let deleted = &roles[&stale.uuid.to_string()];
    assert_eq!(deleted.user, BOB);
    assert_eq!(deleted.role, ROLE_CONTRIBUTOR);
    assert_eq!(deleted.status, Some(EntityStatus::Deleted));

    let event = rx.try_recv().unwrap();
    assert_eq!(event.event_name, EVENT_REMOTE_ROLE_DELETE);
    assert!(event.objects.iter().any(|o| o.label == "user" && o.name == BOB));
    assert_eq!(event.user.as_deref(), Some(ADMIN));
}

#[tokio::test]
async fn local_owner_is_replaced_by_default_admin() {
    for allow_local in [false, true] {
        let (store, site) = target_store(allow_local).await;
        let mut doc = category_and_project_doc();
        doc.projects[PROJECT_UUID].roles = roles(&[(PROJECT_OWNER_UUID, "localowner", ROLE_OWNER)]);

        let out = sync(&store, &site, &doc).await;

        let role = &out.projects[PROJECT_UUID].roles.as_ref().unwrap()[PROJECT_OWNER_UUID];
        assert_eq!(role.user, ADMIN);
        assert_eq!(role.status, Some(EntityStatus::Created));
        assert_eq!(
            role.status_msg.as_deref(),
            Some("Non-federated user \"localowner\" set as owner, assigning role to user \"admin\"")
        );

        let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
        let owner = store.project_owner(project.id).await.unwrap().unwrap();
        assert_eq!(owner.username, ADMIN);
        let before = store.project_assignments(project.id).await.unwrap();

        // Re-syncing reports the substitution again but changes nothing.
        let again = sync(&store, &site, &doc).await;

        let role = &again.projects[PROJECT_UUID].roles.as_ref().unwrap()[PROJECT_OWNER_UUID];
        assert_eq!(role.user, ADMIN);
        assert_eq!(role.status, None);
        assert_eq!(
            role.status_msg.as_deref(),
            Some("Non-federated user \"localowner\" set as owner, assigning role to user \"admin\"")
        );
        assert_eq!(store.project_assignments(project.id).await.unwrap(), before);
    }
}

#[tokio::test]
async fn existing_local_owner_is_kept_when_allowed() {
    let (store, site) = target_store(true).await;
    create_user(&store, "localowner").await;
    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID].roles = roles(&[(PROJECT_OWNER_UUID, "localowner", ROLE_OWNER)]);

    let out = sync(&store, &site, &doc).await;

    let role = &out.projects[PROJECT_UUID].roles.as_ref().unwrap()[PROJECT_OWNER_UUID];
    assert_eq!(role.user, "localowner");
    assert_eq!(role.status_msg, None);
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    let owner = store.project_owner(project.id).await.unwrap().unwrap();
    assert_eq!(owner.username, "localowner");
}

#[tokio::test]
async fn local_contributor_is_refused_when_local_users_disallowed() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID]
        .roles
        .as_mut()
        .unwrap()
        .insert(PROJECT_GUEST_UUID.to_string(), RoleEntry::new("bob", ROLE_CONTRIBUTOR));

    let out = sync(&store, &site, &doc).await;

    assert!(store.find_user_by_username("bob").await.unwrap().is_none());
    let role = &out.projects[PROJECT_UUID].roles.as_ref().unwrap()[PROJECT_GUEST_UUID];
    assert_eq!(role.status, Some(EntityStatus::Error));
    assert_eq!(
        role.status_msg.as_deref(),
        Some("Local user \"bob\" set for role \"contributor\" but local users are not allowed")
    );

    // Everything else went through.
    assert_eq!(out.projects[CATEGORY_UUID].status, Some(EntityStatus::Created));
    assert_eq!(out.projects[PROJECT_UUID].status, Some(EntityStatus::Created));
    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_OWNER_UUID),
        Some(EntityStatus::Created)
    );
    assert_eq!(store.assignment_count().await, 2);
}

#[tokio::test]
async fn local_contributor_needs_an_existing_account() {
    let (store, site) = target_store(true).await;
    let mut doc = category_and_project_doc();
    doc.projects[PROJECT_UUID]
        .roles
        .as_mut()
        .unwrap()
        .insert(PROJECT_GUEST_UUID.to_string(), RoleEntry::new("bob", ROLE_CONTRIBUTOR));

    let out = sync(&store, &site, &doc).await;
    assert_eq!(
        out.projects[PROJECT_UUID].roles.as_ref().unwrap()[PROJECT_GUEST_UUID]
            .status_msg
            .as_deref(),
        Some("Local user \"bob\" not found, role of \"contributor\" will not be assigned")
    );

    // Once the account exists the role is assigned.
    create_user(&store, "bob").await;
    let out = sync(&store, &site, &doc).await;
    assert_eq!(
        role_status(&out, PROJECT_UUID, PROJECT_GUEST_UUID),
        Some(EntityStatus::Created)
    );
}

#[tokio::test]
async fn unknown_role_and_user_are_reported() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    let roles = doc.projects[PROJECT_UUID].roles.as_mut().unwrap();
    roles.insert(
        PROJECT_GUEST_UUID.to_string(),
        RoleEntry::new(ALICE, "superuser"),
    );
    roles.insert(BOB_UUID.to_string(), RoleEntry::new(BOB, ROLE_GUEST));

    let out = sync(&store, &site, &doc).await;

    let roles = out.projects[PROJECT_UUID].roles.as_ref().unwrap();
    assert_eq!(
        roles[PROJECT_GUEST_UUID].status_msg.as_deref(),
        Some(format!("Role object \"superuser\" not found (assignment {PROJECT_GUEST_UUID})").as_str())
    );
    assert_eq!(
        roles[BOB_UUID].status_msg.as_deref(),
        Some("User \"bob@EXAMPLE\" not found, role of \"guest\" will not be assigned")
    );
    assert_eq!(roles[PROJECT_OWNER_UUID].status, Some(EntityStatus::Created));
}

#[tokio::test]
async fn delegate_limit_is_waived_for_remote_projects_only() {
    let (store, site) = target_store(false).await;
    let mut doc = category_and_project_doc();
    doc.users.insert(BOB_UUID.to_string(), user_entry(BOB, "example"));
    doc.users.insert(
        "7f1d0a9e-3c3b-4b8e-8a51-0d6e5c4b2a03".to_string(),
        user_entry("carol@EXAMPLE", "example"),
    );
    let roles = doc.projects[PROJECT_UUID].roles.as_mut().unwrap();
    roles.insert(PROJECT_GUEST_UUID.to_string(), RoleEntry::new(BOB, ROLE_DELEGATE));
    roles.insert(
        "c4e8a1f2-5b6d-4e7f-8091-a2b3c4d5e604".to_string(),
        RoleEntry::new("carol@EXAMPLE", ROLE_DELEGATE),
    );

    sync(&store, &site, &doc).await;
    let project = project_by_key(&store, PROJECT_UUID).await.unwrap();
    assert_eq!(store.project_delegates(project.id).await.unwrap().len(), 2);

    // A local project on the same deployment keeps the limit.
    let local = create_project(&store, "Local", ProjectType::Project, None).await;
    let bob = store.find_user_by_username(BOB).await.unwrap().unwrap();
    let carol = store.find_user_by_username("carol@EXAMPLE").await.unwrap().unwrap();
    assign(&store, &local, &bob, ROLE_DELEGATE).await;
    let delegate = store.find_role_by_name(ROLE_DELEGATE).await.unwrap().unwrap();
    let err = store
        .create_assignment(&CreateRoleAssignment {
            uuid: None,
            project_id: local.id,
            user_id: carol.id,
            role_id: delegate.id,
        })
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Core(CoreError::Validation(_)));
}

#[tokio::test]
async fn creation_events_name_site_and_user() {
    let (store, site) = target_store(false).await;
    let bus = EventBus::default();
    let mut rx = bus.subscribe();

    RemoteProjectApi::new(&store)
        .with_events(&bus)
        .sync_source_data(&site, category_and_project_doc(), None)
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    let names: Vec<&str> = events.iter().map(|e| e.event_name.as_str()).collect();
    assert_eq!(
        names,
        [
            EVENT_REMOTE_PROJECT_CREATE,
            EVENT_REMOTE_ROLE_CREATE,
            EVENT_REMOTE_PROJECT_CREATE,
            EVENT_REMOTE_ROLE_CREATE,
        ]
    );
    let role_event = &events[1];
    assert!(role_event.objects.iter().any(|o| o.label == "user" && o.name == ALICE));
    assert!(events.iter().all(|e| e.objects.iter().any(|o| o.label == "site")));
}
