//! Task entity models and request DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use webrobot_core::scheduling::TaskStatus;
use webrobot_core::types::{DbId, Scope, Timestamp};

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub test_id: DbId,
    pub test_suite: String,
    pub endpoint_list: Vec<String>,
    pub priority: i32,
    pub parallelization: bool,
    pub variables: serde_json::Value,
    pub test_cases: Vec<String>,
    pub tester_id: DbId,
    pub upload_dir: String,
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
    pub status_id: i16,
    pub schedule_date: Timestamp,
    pub run_date: Option<Timestamp>,
    pub comment: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn scope(&self) -> Scope {
        Scope::new(self.organization_id, self.team_id)
    }

    pub fn status(&self) -> Option<TaskStatus> {
        TaskStatus::from_id(self.status_id)
    }
}

/// Insert DTO for the `tasks` table.
///
/// Holds exactly the fields a task may be created with. Identity, the
/// audit timestamps and the run date are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub test_id: DbId,
    pub test_suite: String,
    pub endpoint_list: Vec<String>,
    pub priority: i32,
    pub parallelization: bool,
    pub variables: serde_json::Value,
    pub test_cases: Vec<String>,
    pub tester_id: DbId,
    pub upload_dir: String,
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
    pub status: TaskStatus,
    /// `None` lets the store stamp the insert time.
    pub schedule_date: Option<Timestamp>,
    pub comment: Option<String>,
}

impl NewTask {
    /// Copy every cloneable field of `template` into a fresh insert.
    ///
    /// Used to expand a parallel submission into one task per endpoint.
    /// `id`, `run_date`, `created_at` and `updated_at` are not copied.
    pub fn from_template(template: &Task) -> Self {
        Self {
            test_id: template.test_id,
            test_suite: template.test_suite.clone(),
            endpoint_list: template.endpoint_list.clone(),
            priority: template.priority,
            parallelization: template.parallelization,
            variables: template.variables.clone(),
            test_cases: template.test_cases.clone(),
            tester_id: template.tester_id,
            upload_dir: template.upload_dir.clone(),
            organization_id: template.organization_id,
            team_id: template.team_id,
            status: template.status().unwrap_or(TaskStatus::Waiting),
            schedule_date: Some(template.schedule_date),
            comment: template.comment.clone(),
        }
    }
}

/// DTO for submitting a test run.
///
/// `variables` and `test_cases` are kept as raw JSON so their shape can be
/// reported as an invalid argument rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitTask {
    pub test_suite: Option<String>,
    pub endpoint_list: Option<Vec<String>>,
    pub priority: Option<i32>,
    pub parallelization: Option<bool>,
    pub variables: Option<serde_json::Value>,
    pub test_cases: Option<serde_json::Value>,
    pub upload_dir: Option<String>,
}

/// DTO for cancelling a queued or running task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelTask {
    pub address: Option<String>,
    pub priority: Option<i32>,
}

/// DTO for annotating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskComment {
    pub comment: Option<String>,
}

/// Query parameters for per-day task statistics (milliseconds since epoch).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskStatsQuery {
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}
