//! Remote site and remote project grant models.

use roster_core::remote::{sanitize_site_url, RemoteLevel, SiteMode};
use roster_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A peer deployment from the `remote_sites` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RemoteSite {
    pub id: DbId,
    pub uuid: Uuid,
    pub name: String,
    pub url: String,
    #[sqlx(try_from = "String")]
    pub mode: SiteMode,
    pub description: String,
    #[serde(skip_serializing)]
    pub secret: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RemoteSite {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        sanitize_site_url(&self.url)
    }
}

/// DTO for registering a peer site.
///
/// `secret` is generated when omitted (for target sites registered on a
/// source deployment).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRemoteSite {
    pub name: String,
    pub url: String,
    pub mode: String,
    #[serde(default)]
    pub description: String,
    pub secret: Option<String>,
}

/// A grant row from the `remote_projects` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct RemoteProject {
    pub id: DbId,
    pub uuid: Uuid,
    pub project_uuid: Uuid,
    pub project_id: Option<DbId>,
    pub site_id: DbId,
    #[sqlx(try_from = "String")]
    pub level: RemoteLevel,
    pub date_access: Option<Timestamp>,
}

/// DTO for setting the access level of a project for a site.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertRemoteProject {
    pub site_id: DbId,
    pub project_uuid: Uuid,
    pub project_id: Option<DbId>,
    pub level: RemoteLevel,
}
