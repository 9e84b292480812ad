use crate::types::DbId;

/// Domain error taxonomy returned by every core operation.
///
/// The HTTP layer maps each variant to a status code; nothing below it
/// decides how a failure is presented.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Bad credentials or an invalid, expired, or wrong-type token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid identity without the role or ownership the action needs.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity exists but its current state forbids the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The backing store failed. Never retried inside the core.
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing entity.
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }
}
