//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod event_repo;
pub mod task_queue_repo;
pub mod task_repo;
pub mod test_repo;

pub use event_repo::EventRepo;
pub use task_queue_repo::TaskQueueRepo;
pub use task_repo::TaskRepo;
pub use test_repo::TestRepo;
