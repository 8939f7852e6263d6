//! [`TaskStore`] backed by the `webrobot-db` repositories.

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use webrobot_core::scheduling::TaskStatus;
use webrobot_core::statistics::{DayStats, DayWindow};
use webrobot_core::types::{DbId, Scope};
use webrobot_db::models::task::{NewTask, Task};
use webrobot_db::models::task_queue::{QueueKey, TaskQueue};
use webrobot_db::models::test_suite::Test;
use webrobot_db::repositories::{TaskQueueRepo, TaskRepo, TestRepo};
use webrobot_db::DbPool;

use super::TaskStore;
use crate::config::DispatchConfig;
use crate::error::StoreError;

#[derive(Clone)]
pub struct PgTaskStore {
    pool: DbPool,
}

impl PgTaskStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connect using `config`, verify the connection and apply migrations.
    pub async fn connect(config: &DispatchConfig) -> Result<Self, StoreError> {
        let pool = webrobot_db::create_pool(&config.database_url, config.max_connections).await?;
        webrobot_db::health_check(&pool).await?;
        webrobot_db::run_migrations(&pool).await?;
        tracing::info!(
            max_connections = config.max_connections,
            "Task store connected"
        );
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Constraint violations mean the row itself is invalid, not that the
/// database is unhealthy.
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::CheckViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::UniqueViolation => StoreError::Rejected(db.message().to_string()),
            _ => StoreError::Database(err),
        },
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn find_tests(&self, test_suite: &str, scope: Scope) -> Result<Vec<Test>, StoreError> {
        Ok(TestRepo::find_by_suite(&self.pool, test_suite, scope).await?)
    }

    async fn list_tests(&self, scope: Scope) -> Result<Vec<Test>, StoreError> {
        Ok(TestRepo::list(&self.pool, scope).await?)
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        TaskRepo::create(&self.pool, &task).await.map_err(classify)
    }

    async fn find_task(&self, id: DbId) -> Result<Option<Task>, StoreError> {
        Ok(TaskRepo::find_by_id(&self.pool, id).await?)
    }

    async fn delete_task(&self, id: DbId) -> Result<bool, StoreError> {
        Ok(TaskRepo::delete(&self.pool, id).await?)
    }

    async fn update_comment(&self, id: DbId, comment: &str) -> Result<Option<Task>, StoreError> {
        Ok(TaskRepo::update_comment(&self.pool, id, comment).await?)
    }

    async fn update_status(
        &self,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        Ok(TaskRepo::transition(&self.pool, id, status).await?)
    }

    async fn find_queue(&self, key: &QueueKey) -> Result<Option<TaskQueue>, StoreError> {
        Ok(TaskQueueRepo::find_by_key(&self.pool, key).await?)
    }

    async fn push_task(
        &self,
        queue_id: DbId,
        task_id: DbId,
    ) -> Result<Option<TaskQueue>, StoreError> {
        Ok(TaskQueueRepo::push(&self.pool, queue_id, task_id).await?)
    }

    async fn count_day(&self, scope: Scope, window: DayWindow) -> Result<DayStats, StoreError> {
        Ok(TaskRepo::day_stats(&self.pool, scope, window).await?)
    }
}
