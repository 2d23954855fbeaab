//! The sync document exchanged between a source and a target site.
//!
//! Maps preserve insertion order so a document survives a round trip
//! through JSON unchanged.

use indexmap::IndexMap;
use roster_core::project::ProjectType;
use roster_core::remote::RemoteLevel;
use serde::{Deserialize, Deserializer, Serialize};

/// Outcome recorded on an entity by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Created,
    Updated,
    Deleted,
    Error,
}

/// Users keyed by source-side user UUID and projects keyed by source-side
/// project UUID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncDocument {
    #[serde(default)]
    pub users: IndexMap<String, UserEntry>,
    #[serde(default)]
    pub projects: IndexMap<String, ProjectEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub title: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub level: RemoteLevel,
    /// Only set at `VIEW_AVAIL`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<String>,
    /// `None` when absent, `Some(None)` for an explicit `null` (root).
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_uuid: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<IndexMap<String, RoleEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_msg: Option<String>,
}

impl ProjectEntry {
    /// Minimal entry carrying only the fields every level shares.
    pub fn new(title: impl Into<String>, project_type: ProjectType, level: RemoteLevel) -> Self {
        Self {
            title: title.into(),
            project_type,
            level,
            available: None,
            description: None,
            readme: None,
            parent_uuid: None,
            roles: None,
            status: None,
            status_msg: None,
        }
    }

    /// Parent UUID, `None` at the root or when not shared.
    pub fn parent(&self) -> Option<&str> {
        self.parent_uuid.as_ref().and_then(|p| p.as_deref())
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status = Some(EntityStatus::Error);
        self.status_msg = Some(msg.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleEntry {
    /// Username of the assignee.
    pub user: String,
    /// Role name.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EntityStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_msg: Option<String>,
}

impl RoleEntry {
    pub fn new(user: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: role.into(),
            status: None,
            status_msg: None,
        }
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status = Some(EntityStatus::Error);
        self.status_msg = Some(msg.into());
    }
}

impl SyncDocument {
    /// Whether any entry grants `READ_ROLES`.
    pub fn has_read_roles(&self) -> bool {
        self.projects
            .values()
            .any(|p| p.level == RemoteLevel::ReadRoles)
    }

    /// Whether any user, project or role entry carries a status.
    pub fn has_status(&self) -> bool {
        self.users.values().any(|u| u.status.is_some())
            || self.projects.values().any(|p| {
                p.status.is_some()
                    || p.roles
                        .as_ref()
                        .is_some_and(|roles| roles.values().any(|r| r.status.is_some()))
            })
    }
}

/// Distinguish a present `null` from an absent key.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
