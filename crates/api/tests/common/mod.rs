#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use roster_core::project::ProjectType;
use roster_core::remote::{RemoteLevel, SiteMode};
use roster_core::settings::ProjectRolesSettings;
use roster_db::models::project::{CreateProject, Project};
use roster_db::models::remote::{CreateRemoteSite, RemoteSite, UpsertRemoteProject};
use roster_db::models::role::CreateRoleAssignment;
use roster_db::models::user::{CreateUser, User};
use roster_db::{MemoryStore, ProjectRoleStore};
use roster_events::EventBus;
use roster_sync::transport::DEFAULT_TIMEOUT;
use roster_sync::RemoteClient;
use tower::ServiceExt;

use roster_api::config::ServerConfig;
use roster_api::router::build_app_router;
use roster_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        remote_sync_timeout_secs: 30,
    }
}

/// Build the full application router over `store`, with the same
/// middleware stack production uses.
pub fn build_test_app(store: Arc<MemoryStore>) -> Router {
    build_test_app_with_events(store, Arc::new(EventBus::default()))
}

pub fn build_test_app_with_events(store: Arc<MemoryStore>, event_bus: Arc<EventBus>) -> Router {
    let config = test_config();
    let state = AppState {
        store,
        config: Arc::new(config.clone()),
        event_bus,
        remote_client: RemoteClient::new(DEFAULT_TIMEOUT).unwrap(),
    };
    build_app_router(state, &config)
}

pub fn source_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::default())
}

pub fn target_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(ProjectRolesSettings {
        site_mode: SiteMode::Target,
        ..Default::default()
    }))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub async fn create_site(
    store: &MemoryStore,
    name: &str,
    url: &str,
    mode: SiteMode,
    secret: Option<&str>,
) -> RemoteSite {
    store
        .create_remote_site(&CreateRemoteSite {
            name: name.to_string(),
            url: url.to_string(),
            mode: mode.to_string(),
            description: String::new(),
            secret: secret.map(str::to_string),
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
