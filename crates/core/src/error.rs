use crate::types::DbId;

/// Domain errors shared by the persistence layer, the sync engine and the
/// HTTP service.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Lookup by a natural key (UUID, username, secret) found nothing.
    #[error("Entity not found: {entity} \"{key}\"")]
    NotFoundByKey { entity: &'static str, key: String },

    /// A model invariant was violated. The record was not saved.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFoundByKey`].
    pub fn not_found_by(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFoundByKey {
            entity,
            key: key.to_string(),
        }
    }
}
