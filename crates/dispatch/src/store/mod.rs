//! The persistence seam used by the dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use webrobot_core::scheduling::TaskStatus;
use webrobot_core::statistics::{DayStats, DayWindow};
use webrobot_core::types::{DbId, Scope};
use webrobot_db::models::task::{NewTask, Task};
use webrobot_db::models::task_queue::{QueueKey, TaskQueue};
use webrobot_db::models::test_suite::Test;

use crate::error::StoreError;

pub mod memory;
pub mod postgres;

/// Durable storage for tests, tasks and task queues.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Test definitions named `test_suite` visible from `scope`.
    async fn find_tests(&self, test_suite: &str, scope: Scope) -> Result<Vec<Test>, StoreError>;

    async fn list_tests(&self, scope: Scope) -> Result<Vec<Test>, StoreError>;

    /// Persist a task. Constraint violations surface as
    /// [`StoreError::Rejected`].
    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError>;

    async fn find_task(&self, id: DbId) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, id: DbId) -> Result<bool, StoreError>;

    async fn update_comment(&self, id: DbId, comment: &str) -> Result<Option<Task>, StoreError>;

    /// Move a task along the status state machine. `None` if the task is
    /// missing or cannot reach `status` from where it is.
    async fn update_status(&self, id: DbId, status: TaskStatus)
        -> Result<Option<Task>, StoreError>;

    async fn find_queue(&self, key: &QueueKey) -> Result<Option<TaskQueue>, StoreError>;

    /// Atomically append `task_id` to a queue's waiting list.
    ///
    /// `None` means the queue record could not be updated.
    async fn push_task(
        &self,
        queue_id: DbId,
        task_id: DbId,
    ) -> Result<Option<TaskQueue>, StoreError>;

    async fn count_day(&self, scope: Scope, window: DayWindow) -> Result<DayStats, StoreError>;
}

#[async_trait]
impl<T: TaskStore + ?Sized> TaskStore for Arc<T> {
    async fn find_tests(&self, test_suite: &str, scope: Scope) -> Result<Vec<Test>, StoreError> {
        (**self).find_tests(test_suite, scope).await
    }

    async fn list_tests(&self, scope: Scope) -> Result<Vec<Test>, StoreError> {
        (**self).list_tests(scope).await
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        (**self).create_task(task).await
    }

    async fn find_task(&self, id: DbId) -> Result<Option<Task>, StoreError> {
        (**self).find_task(id).await
    }

    async fn delete_task(&self, id: DbId) -> Result<bool, StoreError> {
        (**self).delete_task(id).await
    }

    async fn update_comment(&self, id: DbId, comment: &str) -> Result<Option<Task>, StoreError> {
        (**self).update_comment(id, comment).await
    }

    async fn update_status(
        &self,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        (**self).update_status(id, status).await
    }

    async fn find_queue(&self, key: &QueueKey) -> Result<Option<TaskQueue>, StoreError> {
        (**self).find_queue(key).await
    }

    async fn push_task(
        &self,
        queue_id: DbId,
        task_id: DbId,
    ) -> Result<Option<TaskQueue>, StoreError> {
        (**self).push_task(queue_id, task_id).await
    }

    async fn count_day(&self, scope: Scope, window: DayWindow) -> Result<DayStats, StoreError> {
        (**self).count_day(scope, window).await
    }
}
