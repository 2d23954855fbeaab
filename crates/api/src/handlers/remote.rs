//! Handlers for remote site federation.
//!
//! A `SOURCE` deployment registers its `TARGET` sites, grants them access to
//! projects and serves their sync documents. A `TARGET` deployment registers
//! the one `SOURCE` it pulls from and can trigger a pull on demand.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use roster_core::error::CoreError;
use roster_core::remote::{RemoteLevel, SiteMode};
use roster_core::types::Timestamp;
use roster_db::models::remote::{CreateRemoteSite, RemoteProject, RemoteSite, UpsertRemoteProject};
use roster_sync::RemoteProjectApi;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /remote/sites`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSiteRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(url)]
    pub url: String,
    pub mode: String,
    #[serde(default)]
    pub description: String,
    /// Required when registering a source site; generated otherwise.
    #[validate(length(min = 1, max = 255))]
    pub secret: Option<String>,
}

/// Body of `PUT /remote/sites/{uuid}/access`.
#[derive(Debug, Deserialize)]
pub struct SetAccessRequest {
    pub projects: Vec<ProjectAccess>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectAccess {
    pub project_uuid: Uuid,
    pub level: RemoteLevel,
}

/// A newly registered site, the only response that reveals its secret.
#[derive(Debug, Serialize)]
pub struct CreatedSite {
    #[serde(flatten)]
    pub site: RemoteSite,
    pub secret: String,
}

#[derive(Debug, Serialize)]
pub struct SiteSummary {
    #[serde(flatten)]
    pub site: RemoteSite,
    pub last_access: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct SiteDetail {
    #[serde(flatten)]
    pub site: RemoteSite,
    pub last_access: Option<Timestamp>,
    pub projects: Vec<RemoteProject>,
}

async fn find_site(state: &AppState, uuid: Uuid) -> AppResult<RemoteSite> {
    state
        .store
        .find_remote_site_by_uuid(uuid)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found_by("RemoteSite", uuid)))
}

// ---------------------------------------------------------------------------
// Peer endpoint
// ---------------------------------------------------------------------------

/// GET /api/v1/remote/get/{secret}
///
/// Serve the sync document for the `TARGET` site registered with `secret`
/// and refresh the access dates of its grants. The body is the bare
/// document, not wrapped in a data envelope.
pub async fn get_remote_data(
    State(state): State<AppState>,
    Path(secret): Path<String>,
) -> AppResult<impl IntoResponse> {
    let Some(site) = state
        .store
        .find_remote_site_by_secret(&secret, SiteMode::Target)
        .await?
    else {
        tracing::warn!("Remote data requested with an unknown secret");
        return Err(AppError::Core(CoreError::not_found_by(
            "RemoteSite",
            "(secret)",
        )));
    };

    let doc = RemoteProjectApi::new(state.store.as_ref())
        .get_target_data(&site)
        .await?;
    let touched = state.store.touch_remote_projects(site.id).await?;

    tracing::info!(
        site = %site.name,
        users = doc.users.len(),
        projects = doc.projects.len(),
        touched,
        "Served remote data",
    );

    Ok(Json(doc))
}

// ---------------------------------------------------------------------------
// Site registry
// ---------------------------------------------------------------------------

/// GET /api/v1/remote/sites
pub async fn list_sites(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let sites = state.store.list_remote_sites().await?;

    let mut data = Vec::with_capacity(sites.len());
    for site in sites {
        let last_access = state.store.site_last_access(site.id).await?;
        data.push(SiteSummary { site, last_access });
    }

    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/remote/sites
///
/// A `SOURCE` deployment registers `TARGET` sites and generates their
/// secret. A `TARGET` deployment registers a single `SOURCE` site using the
/// secret that source issued for it.
pub async fn create_site(
    State(state): State<AppState>,
    Json(input): Json<CreateSiteRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let mode: SiteMode = input.mode.parse()?;
    let site_mode = state.store.settings().site_mode;

    let secret = match site_mode {
        SiteMode::Source => {
            if mode != SiteMode::Target {
                return Err(AppError::BadRequest(
                    "A SOURCE site can only register TARGET sites".to_string(),
                ));
            }
            None
        }
        SiteMode::Target => {
            if mode != SiteMode::Source {
                return Err(AppError::BadRequest(
                    "A TARGET site can only register a SOURCE site".to_string(),
                ));
            }
            if state.store.find_source_site().await?.is_some() {
                return Err(AppError::Core(CoreError::Conflict(
                    "A source site is already registered".to_string(),
                )));
            }
            let Some(secret) = input.secret.clone() else {
                return Err(AppError::BadRequest(
                    "Secret of the source site is required".to_string(),
                ));
            };
            Some(secret)
        }
    };

    let site = state
        .store
        .create_remote_site(&CreateRemoteSite {
            name: input.name,
            url: input.url,
            mode: mode.as_str().to_string(),
            description: input.description,
            secret,
        })
        .await?;

    tracing::info!(
        site = %site.uuid,
        name = %site.name,
        mode = %site.mode,
        "Remote site registered",
    );

    let secret = site.secret.clone();
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedSite { site, secret },
        }),
    ))
}

/// GET /api/v1/remote/sites/{uuid}
pub async fn get_site(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let site = find_site(&state, uuid).await?;
    let last_access = state.store.site_last_access(site.id).await?;
    let projects = state.store.site_remote_projects(site.id).await?;

    Ok(Json(DataResponse {
        data: SiteDetail {
            site,
            last_access,
            projects,
        },
    }))
}

/// DELETE /api/v1/remote/sites/{uuid}
///
/// Removes the site together with its grants.
pub async fn delete_site(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    if !state.store.delete_remote_site(uuid).await? {
        return Err(AppError::Core(CoreError::not_found_by("RemoteSite", uuid)));
    }

    tracing::info!(site = %uuid, "Remote site deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/remote/sites/{uuid}/access
///
/// Set the access level of each listed project for a `TARGET` site. Only
/// available on a `SOURCE` deployment. Unlisted grants are left unchanged.
pub async fn set_site_access(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
    Json(input): Json<SetAccessRequest>,
) -> AppResult<impl IntoResponse> {
    if state.store.settings().site_mode != SiteMode::Source {
        return Err(AppError::BadRequest(
            "Project access can only be granted by a SOURCE site".to_string(),
        ));
    }

    let site = find_site(&state, uuid).await?;
    if site.mode != SiteMode::Target {
        return Err(AppError::BadRequest(format!(
            "Remote site \"{}\" is not a TARGET site",
            site.name
        )));
    }

    // Resolve every project before writing anything.
    let mut grants = Vec::with_capacity(input.projects.len());
    for access in &input.projects {
        let project = state
            .store
            .find_project_by_uuid(access.project_uuid)
            .await?
            .ok_or_else(|| CoreError::not_found_by("project", access.project_uuid))?;
        grants.push(UpsertRemoteProject {
            site_id: site.id,
            project_uuid: project.uuid,
            project_id: Some(project.id),
            level: access.level,
        });
    }

    for grant in &grants {
        state.store.upsert_remote_project(grant).await?;
        tracing::info!(
            site = %site.name,
            project = %grant.project_uuid,
            level = %grant.level,
            "Remote project access set",
        );
    }

    let projects = state.store.site_remote_projects(site.id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/remote/sites/{uuid}/sync
///
/// Pull the document of a `SOURCE` site and apply it. Responds with the
/// document annotated with the per-entity outcome.
pub async fn sync_site(
    State(state): State<AppState>,
    Path(uuid): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let site = find_site(&state, uuid).await?;

    let doc = roster_sync::sync_from_site(
        state.store.as_ref(),
        &state.remote_client,
        Some(state.event_bus.as_ref()),
        &site,
    )
    .await?;

    Ok(Json(DataResponse { data: doc }))
}
