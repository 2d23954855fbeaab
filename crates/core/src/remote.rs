//! Remote site modes, per-project access levels, and site helpers.

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Length of generated site secrets.
pub const SECRET_LENGTH: usize = 32;

/// Role of a deployment in a federation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteMode {
    /// Owns projects and serves them to targets.
    Source,
    /// Pulls projects from a single source.
    Target,
}

impl SiteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteMode::Source => "SOURCE",
            SiteMode::Target => "TARGET",
        }
    }
}

impl std::fmt::Display for SiteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SiteMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SOURCE" => Ok(SiteMode::Source),
            "TARGET" => Ok(SiteMode::Target),
            other => Err(CoreError::Validation(format!(
                "Mode \"{other}\" not found in SITE_MODES"
            ))),
        }
    }
}

impl TryFrom<String> for SiteMode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Access level a source site grants a target site for one project.
///
/// Variants are declared in ascending order so that `Ord` follows
/// `NONE < VIEW_AVAIL < READ_INFO < READ_ROLES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteLevel {
    None,
    ViewAvail,
    ReadInfo,
    ReadRoles,
}

impl RemoteLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteLevel::None => "NONE",
            RemoteLevel::ViewAvail => "VIEW_AVAIL",
            RemoteLevel::ReadInfo => "READ_INFO",
            RemoteLevel::ReadRoles => "READ_ROLES",
        }
    }

    /// Whether project details (description, readme, lineage) are shared.
    pub fn includes_info(self) -> bool {
        self >= RemoteLevel::ReadInfo
    }

    /// Whether role assignments are shared.
    pub fn includes_roles(self) -> bool {
        self == RemoteLevel::ReadRoles
    }
}

impl std::fmt::Display for RemoteLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RemoteLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NONE" => Ok(RemoteLevel::None),
            "VIEW_AVAIL" => Ok(RemoteLevel::ViewAvail),
            "READ_INFO" => Ok(RemoteLevel::ReadInfo),
            "READ_ROLES" => Ok(RemoteLevel::ReadRoles),
            other => Err(CoreError::Validation(format!(
                "Unknown remote access level \"{other}\""
            ))),
        }
    }
}

impl TryFrom<String> for RemoteLevel {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Strip a single trailing slash from a site URL.
pub fn sanitize_site_url(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Generate a random alphanumeric secret for a new remote site.
pub fn build_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect()
}
