//! Repository for the `task_queues` table.
//!
//! Queues are provisioned per (endpoint, priority, organization, team) by
//! the worker side; the dispatcher only looks them up and appends to them.

use sqlx::PgPool;
use webrobot_core::types::DbId;

use crate::models::task_queue::{QueueKey, TaskQueue};

/// Column list for `task_queues` queries.
const COLUMNS: &str = "\
    id, endpoint_address, priority, organization_id, team_id, \
    running_task_id, tasks, created_at, updated_at";

/// Provides lookup and append operations for task queues.
pub struct TaskQueueRepo;

impl TaskQueueRepo {
    /// Create an empty queue for `key`.
    pub async fn create(pool: &PgPool, key: &QueueKey) -> Result<TaskQueue, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_queues (endpoint_address, priority, organization_id, team_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskQueue>(&query)
            .bind(&key.endpoint_address)
            .bind(key.priority)
            .bind(key.scope.organization_id)
            .bind(key.scope.team_id)
            .fetch_one(pool)
            .await
    }

    /// Find the queue for `key`. A team-less key matches a NULL team.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &QueueKey,
    ) -> Result<Option<TaskQueue>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM task_queues \
             WHERE endpoint_address = $1 AND priority = $2 \
               AND organization_id = $3 AND team_id IS NOT DISTINCT FROM $4"
        );
        sqlx::query_as::<_, TaskQueue>(&query)
            .bind(&key.endpoint_address)
            .bind(key.priority)
            .bind(key.scope.organization_id)
            .bind(key.scope.team_id)
            .fetch_optional(pool)
            .await
    }

    /// Append `task_id` to the waiting list of a queue.
    ///
    /// A single `UPDATE ... array_append` so concurrent pushes to the same
    /// queue serialize on the row lock and none is lost. Returns `None`
    /// when the queue row no longer exists.
    pub async fn push(
        pool: &PgPool,
        queue_id: DbId,
        task_id: DbId,
    ) -> Result<Option<TaskQueue>, sqlx::Error> {
        let query = format!(
            "UPDATE task_queues \
             SET tasks = array_append(tasks, $2), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TaskQueue>(&query)
            .bind(queue_id)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }
}
