//! Row models and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the insert DTO where rows are created by this
//! service.

pub mod event;
pub mod task;
pub mod task_queue;
pub mod test_suite;
