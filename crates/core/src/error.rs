//! Domain error taxonomy shared by every layer.
//!
//! Each variant carries a stable machine-readable code (see
//! [`CoreError::code`]) so callers can classify failures without matching
//! on message text.

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// An event could not be handed to the worker pool.
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The store rejected a record on save.
    #[error("Storage validation failed: {0}")]
    StorageValidation(String),

    /// One or more endpoints could not be scheduled.
    #[error("Scheduling failed: {0}")]
    SchedulingFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable error code for responses and logs.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CoreError::OutOfRange(_) => "RANGE_ERROR",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Delivery(_) => "DELIVERY_FAILED",
            CoreError::StorageValidation(_) => "STORAGE_VALIDATION",
            CoreError::SchedulingFailed(_) => "SCHEDULING_FAILED",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for a `NotFound` keyed by anything displayable.
    pub fn not_found(entity: &'static str, key: impl std::fmt::Display) -> Self {
        CoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_variant() {
        let errors = [
            CoreError::not_found("Task", 1),
            CoreError::InvalidArgument(String::new()),
            CoreError::OutOfRange(String::new()),
            CoreError::Conflict(String::new()),
            CoreError::Delivery(String::new()),
            CoreError::StorageValidation(String::new()),
            CoreError::SchedulingFailed(String::new()),
            CoreError::Internal(String::new()),
        ];
        let mut codes: Vec<_> = errors.iter().map(CoreError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn not_found_message_names_entity_and_key() {
        let err = CoreError::not_found("Test suite", "smoke");
        assert_eq!(err.to_string(), "Entity not found: Test suite smoke");
    }
}
