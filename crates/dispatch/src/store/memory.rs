//! In-memory [`TaskStore`] for tests and local runs.
//!
//! Mirrors the Postgres constraints that matter to the dispatcher (a task
//! needs a known test and at least one endpoint) and can be told to fail
//! saves or pushes so error paths can be exercised.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use webrobot_core::scheduling::TaskStatus;
use webrobot_core::statistics::{DayStats, DayWindow};
use webrobot_core::types::{DbId, Scope};
use webrobot_db::models::task::{NewTask, Task};
use webrobot_db::models::task_queue::{QueueKey, TaskQueue};
use webrobot_db::models::test_suite::{NewTest, Test};

use super::TaskStore;
use crate::error::StoreError;

#[derive(Default)]
struct State {
    next_id: DbId,
    tests: BTreeMap<DbId, Test>,
    tasks: BTreeMap<DbId, Task>,
    queues: BTreeMap<DbId, TaskQueue>,
    reject_saves: bool,
    failing_pushes: HashSet<DbId>,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryTaskStore {
    state: Mutex<State>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_test(&self, input: NewTest) -> Test {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let test = Test {
            id: state.next_id(),
            test_suite: input.test_suite,
            test_cases: input.test_cases,
            variables: input.variables,
            author_id: input.author_id,
            organization_id: input.organization_id,
            team_id: input.team_id,
            created_at: now,
            updated_at: now,
        };
        state.tests.insert(test.id, test.clone());
        test
    }

    /// Create an empty queue, the way the worker side provisions them.
    pub async fn provision_queue(&self, key: QueueKey) -> TaskQueue {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let queue = TaskQueue {
            id: state.next_id(),
            endpoint_address: key.endpoint_address,
            priority: key.priority,
            organization_id: key.scope.organization_id,
            team_id: key.scope.team_id,
            running_task_id: None,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.queues.insert(queue.id, queue.clone());
        queue
    }

    /// Mark a queue as busy with `task_id`, as a worker would.
    pub async fn set_running(&self, queue_id: DbId, task_id: Option<DbId>) {
        if let Some(queue) = self.state.lock().await.queues.get_mut(&queue_id) {
            queue.running_task_id = task_id;
        }
    }

    pub async fn queue(&self, queue_id: DbId) -> Option<TaskQueue> {
        self.state.lock().await.queues.get(&queue_id).cloned()
    }

    /// Every stored task, ordered by id.
    pub async fn tasks(&self) -> Vec<Task> {
        self.state.lock().await.tasks.values().cloned().collect()
    }

    /// Make every subsequent `create_task` fail with [`StoreError::Rejected`].
    pub async fn reject_saves(&self, reject: bool) {
        self.state.lock().await.reject_saves = reject;
    }

    /// Make pushes to `queue_id` fail with [`StoreError::Unavailable`].
    pub async fn fail_pushes_to(&self, queue_id: DbId) {
        self.state.lock().await.failing_pushes.insert(queue_id);
    }
}

fn in_window(at: Option<chrono::DateTime<Utc>>, window: &DayWindow) -> bool {
    at.is_some_and(|at| window.start <= at && at <= window.end)
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn find_tests(&self, test_suite: &str, scope: Scope) -> Result<Vec<Test>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .tests
            .values()
            .filter(|t| t.test_suite == test_suite)
            .filter(|t| scope.contains(Scope::new(t.organization_id, t.team_id)))
            .cloned()
            .collect())
    }

    async fn list_tests(&self, scope: Scope) -> Result<Vec<Test>, StoreError> {
        let state = self.state.lock().await;
        let mut tests: Vec<Test> = state
            .tests
            .values()
            .filter(|t| Scope::new(t.organization_id, t.team_id) == scope)
            .cloned()
            .collect();
        tests.sort_by(|a, b| a.test_suite.cmp(&b.test_suite).then(a.id.cmp(&b.id)));
        Ok(tests)
    }

    async fn create_task(&self, task: NewTask) -> Result<Task, StoreError> {
        let mut state = self.state.lock().await;
        if state.reject_saves {
            return Err(StoreError::Rejected("task record rejected by store".into()));
        }
        if task.endpoint_list.is_empty() {
            return Err(StoreError::Rejected("endpoint_list must not be empty".into()));
        }
        if !state.tests.contains_key(&task.test_id) {
            return Err(StoreError::Rejected(format!(
                "test {} does not exist",
                task.test_id
            )));
        }

        let now = Utc::now();
        let stored = Task {
            id: state.next_id(),
            test_id: task.test_id,
            test_suite: task.test_suite,
            endpoint_list: task.endpoint_list,
            priority: task.priority,
            parallelization: task.parallelization,
            variables: task.variables,
            test_cases: task.test_cases,
            tester_id: task.tester_id,
            upload_dir: task.upload_dir,
            organization_id: task.organization_id,
            team_id: task.team_id,
            status_id: task.status.id(),
            schedule_date: task.schedule_date.unwrap_or(now),
            run_date: None,
            comment: task.comment,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_task(&self, id: DbId) -> Result<Option<Task>, StoreError> {
        Ok(self.state.lock().await.tasks.get(&id).cloned())
    }

    async fn delete_task(&self, id: DbId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let removed = state.tasks.remove(&id).is_some();
        if removed {
            for queue in state.queues.values_mut() {
                if queue.running_task_id == Some(id) {
                    queue.running_task_id = None;
                }
            }
        }
        Ok(removed)
    }

    async fn update_comment(&self, id: DbId, comment: &str) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.lock().await;
        Ok(state.tasks.get_mut(&id).map(|task| {
            task.comment = Some(comment.to_string());
            task.updated_at = Utc::now();
            task.clone()
        }))
    }

    async fn update_status(
        &self,
        id: DbId,
        status: TaskStatus,
    ) -> Result<Option<Task>, StoreError> {
        let mut state = self.state.lock().await;
        let Some(task) = state.tasks.get_mut(&id) else {
            return Ok(None);
        };
        match task.status() {
            Some(from) if from.can_transition(status) => {}
            _ => return Ok(None),
        }

        let now = Utc::now();
        task.status_id = status.id();
        if status == TaskStatus::Running {
            task.run_date = Some(now);
        }
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn find_queue(&self, key: &QueueKey) -> Result<Option<TaskQueue>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.queues.values().find(|q| q.key() == *key).cloned())
    }

    async fn push_task(
        &self,
        queue_id: DbId,
        task_id: DbId,
    ) -> Result<Option<TaskQueue>, StoreError> {
        let mut state = self.state.lock().await;
        if state.failing_pushes.contains(&queue_id) {
            return Err(StoreError::Unavailable(format!(
                "queue {queue_id} could not be updated"
            )));
        }
        Ok(state.queues.get_mut(&queue_id).map(|queue| {
            queue.tasks.push(task_id);
            queue.updated_at = Utc::now();
            queue.clone()
        }))
    }

    async fn count_day(&self, scope: Scope, window: DayWindow) -> Result<DayStats, StoreError> {
        let state = self.state.lock().await;
        let mut stats = DayStats::default();
        for task in state.tasks.values().filter(|t| t.scope() == scope) {
            match task.status() {
                Some(TaskStatus::Successful) if in_window(task.run_date, &window) => {
                    stats.succeeded += 1
                }
                Some(TaskStatus::Failed) if in_window(task.run_date, &window) => stats.failed += 1,
                Some(TaskStatus::Running) if in_window(task.run_date, &window) => {
                    stats.running += 1
                }
                Some(TaskStatus::Waiting) if in_window(Some(task.schedule_date), &window) => {
                    stats.waiting += 1
                }
                _ => {}
            }
        }
        Ok(stats)
    }
}
