//! Deployment-wide project/role settings.

use crate::error::CoreError;
use crate::remote::SiteMode;
use crate::roles::DEFAULT_DELEGATE_LIMIT;

/// Default username of the fallback project owner.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Settings controlling how this deployment participates in remote sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRolesSettings {
    /// Whether this deployment serves (`SOURCE`) or pulls (`TARGET`) projects.
    pub site_mode: SiteMode,
    /// Local account used as owner when the real owner can not be represented.
    pub default_admin: String,
    /// Whether local (non-federated) users may receive synced roles.
    pub allow_local_users: bool,
    /// Max delegates per project, `0` for unlimited.
    pub delegate_limit: u32,
    /// Nesting disabled; remote sync is unavailable.
    pub disable_categories: bool,
}

impl Default for ProjectRolesSettings {
    fn default() -> Self {
        Self {
            site_mode: SiteMode::Source,
            default_admin: DEFAULT_ADMIN_USERNAME.to_string(),
            allow_local_users: false,
            delegate_limit: DEFAULT_DELEGATE_LIMIT,
            disable_categories: false,
        }
    }
}

impl ProjectRolesSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                           | Default  |
    /// |-----------------------------------|----------|
    /// | `PROJECTROLES_SITE_MODE`          | `SOURCE` |
    /// | `PROJECTROLES_DEFAULT_ADMIN`      | `admin`  |
    /// | `PROJECTROLES_ALLOW_LOCAL_USERS`  | `false`  |
    /// | `PROJECTROLES_DELEGATE_LIMIT`     | `1`      |
    /// | `PROJECTROLES_DISABLE_CATEGORIES` | `false`  |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let site_mode = match lookup("PROJECTROLES_SITE_MODE") {
            Some(value) => value.trim().parse()?,
            None => defaults.site_mode,
        };

        let default_admin = lookup("PROJECTROLES_DEFAULT_ADMIN")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.default_admin);

        let allow_local_users = match lookup("PROJECTROLES_ALLOW_LOCAL_USERS") {
            Some(value) => parse_bool("PROJECTROLES_ALLOW_LOCAL_USERS", &value)?,
            None => defaults.allow_local_users,
        };

        let delegate_limit = match lookup("PROJECTROLES_DELEGATE_LIMIT") {
            Some(value) => value.trim().parse().map_err(|_| {
                CoreError::Validation(format!(
                    "PROJECTROLES_DELEGATE_LIMIT must be a non-negative integer, got \"{value}\""
                ))
            })?,
            None => defaults.delegate_limit,
        };

        let disable_categories = match lookup("PROJECTROLES_DISABLE_CATEGORIES") {
            Some(value) => parse_bool("PROJECTROLES_DISABLE_CATEGORIES", &value)?,
            None => defaults.disable_categories,
        };

        Ok(Self {
            site_mode,
            default_admin,
            allow_local_users,
            delegate_limit,
            disable_categories,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, CoreError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(CoreError::Validation(format!(
            "{key} must be a boolean, got \"{value}\""
        ))),
    }
}
