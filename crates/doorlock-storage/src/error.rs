use thiserror::Error;

/// Storage-specific error types for the door-access controller.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database connection or query execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration execution failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value does not pass validation
    #[error("Corrupted setting {namespace}/{key}: {reason}")]
    Corrupted {
        namespace: String,
        key: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The store refused the write
    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

/// Specialized result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for doorlock_core::Error {
    fn from(err: StorageError) -> Self {
        doorlock_core::Error::storage(err.to_string())
    }
}
