//! Repository for the `tasks` table.
//!
//! Uses `TaskStatus` from `webrobot_core::scheduling` for every status
//! literal; there are no magic numbers in the queries below.

use sqlx::PgPool;
use webrobot_core::scheduling::TaskStatus;
use webrobot_core::statistics::{DayStats, DayWindow};
use webrobot_core::types::{DbId, Scope};

use crate::models::task::{NewTask, Task};

/// Column list for `tasks` queries.
const COLUMNS: &str = "\
    id, test_id, test_suite, endpoint_list, priority, parallelization, \
    variables, test_cases, tester_id, upload_dir, organization_id, team_id, \
    status_id, schedule_date, run_date, comment, created_at, updated_at";

/// Provides CRUD operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task. A `None` schedule date is stamped with `NOW()`.
    pub async fn create(pool: &PgPool, input: &NewTask) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks \
                 (test_id, test_suite, endpoint_list, priority, parallelization, \
                  variables, test_cases, tester_id, upload_dir, organization_id, team_id, \
                  status_id, schedule_date, comment) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
                     COALESCE($13, NOW()), $14) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(input.test_id)
            .bind(&input.test_suite)
            .bind(&input.endpoint_list)
            .bind(input.priority)
            .bind(input.parallelization)
            .bind(&input.variables)
            .bind(&input.test_cases)
            .bind(input.tester_id)
            .bind(&input.upload_dir)
            .bind(input.organization_id)
            .bind(input.team_id)
            .bind(input.status.id())
            .bind(input.schedule_date)
            .bind(&input.comment)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a task. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_comment(
        pool: &PgPool,
        id: DbId,
        comment: &str,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET comment = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(comment)
            .fetch_optional(pool)
            .await
    }

    /// Move a task to `to` if its current status allows it.
    ///
    /// Entering `Running` stamps `run_date`. Returns `None` when the task
    /// does not exist or is not in a status that can reach `to`.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        to: TaskStatus,
    ) -> Result<Option<Task>, sqlx::Error> {
        let allowed_from: Vec<i16> = [
            TaskStatus::Waiting,
            TaskStatus::Running,
            TaskStatus::Successful,
            TaskStatus::Failed,
        ]
        .into_iter()
        .filter(|from| from.can_transition(to))
        .map(TaskStatus::id)
        .collect();

        let query = format!(
            "UPDATE tasks \
             SET status_id = $2, \
                 run_date = CASE WHEN $2 = $4 THEN NOW() ELSE run_date END, \
                 updated_at = NOW() \
             WHERE id = $1 AND status_id = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(to.id())
            .bind(&allowed_from)
            .bind(TaskStatus::Running.id())
            .fetch_optional(pool)
            .await
    }

    /// Count tasks per status inside one statistics window.
    ///
    /// Finished and running tasks are matched on `run_date`, waiting tasks
    /// on `schedule_date`. Both bounds are inclusive.
    pub async fn day_stats(
        pool: &PgPool,
        scope: Scope,
        window: DayWindow,
    ) -> Result<DayStats, sqlx::Error> {
        let (succeeded, failed, running, waiting): (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
                 COUNT(*) FILTER (WHERE status_id = $4 AND run_date BETWEEN $1 AND $2), \
                 COUNT(*) FILTER (WHERE status_id = $5 AND run_date BETWEEN $1 AND $2), \
                 COUNT(*) FILTER (WHERE status_id = $6 AND run_date BETWEEN $1 AND $2), \
                 COUNT(*) FILTER (WHERE status_id = $7 AND schedule_date BETWEEN $1 AND $2) \
             FROM tasks \
             WHERE organization_id = $3 AND team_id IS NOT DISTINCT FROM $8",
        )
        .bind(window.start)
        .bind(window.end)
        .bind(scope.organization_id)
        .bind(TaskStatus::Successful.id())
        .bind(TaskStatus::Failed.id())
        .bind(TaskStatus::Running.id())
        .bind(TaskStatus::Waiting.id())
        .bind(scope.team_id)
        .fetch_one(pool)
        .await?;

        Ok(DayStats {
            succeeded,
            failed,
            running,
            waiting,
        })
    }
}
