use webrobot_core::error::CoreError;

/// Failures of the [`TaskStore`](crate::store::TaskStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// The record violates a store constraint and was not saved.
    #[error("Record rejected: {0}")]
    Rejected(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by every [`Dispatcher`](crate::Dispatcher) entry point.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Stable error code, shared with [`CoreError::code`].
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Core(e) => e.code(),
            DispatchError::Store(_) => "DATABASE_ERROR",
        }
    }

    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            DispatchError::Core(e) => Some(e),
            DispatchError::Store(_) => None,
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
