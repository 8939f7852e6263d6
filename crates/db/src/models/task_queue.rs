//! Per-endpoint task queue models.

use serde::Serialize;
use sqlx::FromRow;
use webrobot_core::types::{DbId, Scope, Timestamp};

/// A row from the `task_queues` table.
///
/// One queue exists per (endpoint, priority, organization, team). It holds
/// at most one running task and an ordered list of waiting task ids.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskQueue {
    pub id: DbId,
    pub endpoint_address: String,
    pub priority: i32,
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
    pub running_task_id: Option<DbId>,
    pub tasks: Vec<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TaskQueue {
    /// No running task and nothing waiting.
    ///
    /// Read before a push, this predicts that the pushed task will be
    /// started right away. It is advisory only: another request may push to
    /// the same queue between the read and the push.
    pub fn is_idle(&self) -> bool {
        self.running_task_id.is_none() && self.tasks.is_empty()
    }

    pub fn key(&self) -> QueueKey {
        QueueKey {
            endpoint_address: self.endpoint_address.clone(),
            priority: self.priority,
            scope: Scope::new(self.organization_id, self.team_id),
        }
    }
}

/// Lookup key of a task queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueueKey {
    pub endpoint_address: String,
    pub priority: i32,
    pub scope: Scope,
}

impl QueueKey {
    pub fn new(endpoint_address: impl Into<String>, priority: i32, scope: Scope) -> Self {
        Self {
            endpoint_address: endpoint_address.into(),
            priority,
            scope,
        }
    }
}
