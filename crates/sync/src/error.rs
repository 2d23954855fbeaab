use roster_db::StoreError;

use crate::transport::TransportError;

/// Failures that abort a whole sync operation.
///
/// Problems with single users, projects or roles are not errors at this
/// level; they are recorded in the returned document instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Local user \"{0}\" defined in PROJECTROLES_DEFAULT_ADMIN not found")]
    DefaultAdminNotFound(String),

    #[error("Project categories and nesting disabled, remote sync disabled")]
    CategoriesDisabled,

    #[error("Site not in TARGET mode, unable to sync")]
    NotTargetMode,

    #[error("No source site defined, unable to sync")]
    NoSourceSite,

    #[error("Remote site \"{0}\" is not a SOURCE site")]
    NotSourceSite(String),

    #[error("Unable to retrieve data from remote site: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid sync document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
