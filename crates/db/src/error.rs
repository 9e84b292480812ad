use laurel_core::error::CoreError;
use laurel_core::refresh::RefreshRejection;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Failure reported by a store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Non-SQL backend failure (used by in-process adapters).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return Self::Duplicate(constraint);
            }
        }
        Self::Database(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => CoreError::Conflict(format!("Duplicate value: {what}")),
            other => CoreError::Persistence(other.to_string()),
        }
    }
}

/// Outcome of looking up a refresh record that must be usable.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error(transparent)]
    Rejected(#[from] RefreshRejection),

    #[error(transparent)]
    Store(#[from] StoreError),
}
