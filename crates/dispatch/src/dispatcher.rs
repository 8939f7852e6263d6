//! Submission, cancellation and bookkeeping of test-run tasks.
//!
//! A submission is expanded into one queue entry per endpoint. Endpoints
//! are processed in request order, one at a time: a missing queue or a
//! failed push only marks that endpoint failed, while a failed publish
//! aborts the whole request.

use serde::Serialize;
use serde_json::json;
use webrobot_core::error::CoreError;
use webrobot_core::event_codes::{EVENT_CODE_CANCEL_TASK, EVENT_CODE_START_TASK};
use webrobot_core::paths::is_path_secure;
use webrobot_core::report::TaskReport;
use webrobot_core::scheduling::{validate_priority, TaskStatus, QUEUE_PRIORITY_DEFAULT};
use webrobot_core::statistics::{day_windows, resolve_range, DayStats};
use webrobot_core::submission::{
    require_cancel_target, require_comment, require_test_suite, resolve_priority,
    validate_endpoints, validate_test_cases, validate_variables,
};
use webrobot_core::types::{DbId, Scope, Timestamp};
use webrobot_db::models::task::{
    CancelTask, NewTask, SubmitTask, Task, TaskStatsQuery, UpdateTaskComment,
};
use webrobot_db::models::task_queue::QueueKey;
use webrobot_db::models::test_suite::{Test, TestCases};
use webrobot_events::{EventPublisher, TaskEvent};

use crate::config::DispatchConfig;
use crate::error::{DispatchError, DispatchResult, StoreError};
use crate::store::TaskStore;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Overall verdict of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    Scheduled,
    /// At least one endpoint was rejected; the lists say which.
    SchedulingFailed,
}

/// Per-endpoint result of a submission.
///
/// `running` only ever holds ids that are also in `succeeded`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub failed: Vec<DbId>,
    pub succeeded: Vec<DbId>,
    pub running: Vec<DbId>,
}

impl DispatchOutcome {
    pub fn status(&self) -> DispatchStatus {
        if self.failed.is_empty() {
            DispatchStatus::Scheduled
        } else {
            DispatchStatus::SchedulingFailed
        }
    }

    /// The aggregate error to report alongside the lists, if any endpoint failed.
    pub fn error(&self) -> Option<CoreError> {
        match self.status() {
            DispatchStatus::Scheduled => None,
            DispatchStatus::SchedulingFailed => Some(CoreError::SchedulingFailed(format!(
                "{} of {} endpoints could not be scheduled",
                self.failed.len(),
                self.failed.len() + self.succeeded.len()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<S, P> {
    store: S,
    publisher: P,
    default_priority: i32,
}

impl<S: TaskStore, P: EventPublisher> Dispatcher<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            store,
            publisher,
            default_priority: QUEUE_PRIORITY_DEFAULT,
        }
    }

    /// Dispatcher using the configured default priority.
    pub fn from_config(store: S, publisher: P, config: &DispatchConfig) -> Result<Self, CoreError> {
        Self::new(store, publisher).with_default_priority(config.default_priority)
    }

    /// Priority applied when a submission does not name one.
    ///
    /// An out-of-range default is a configuration error and is rejected here
    /// rather than on every submission.
    pub fn with_default_priority(mut self, priority: i32) -> Result<Self, CoreError> {
        validate_priority(priority).map_err(|e| {
            CoreError::InvalidArgument(format!("default task priority: {e}"))
        })?;
        self.default_priority = priority;
        Ok(self)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submit a test run to every endpoint in the request.
    ///
    /// Input is validated before anything is written. With
    /// `parallelization` the first saved task is only a template: it is
    /// cloned once per endpoint and deleted afterwards. Without it the same
    /// task is pushed to every endpoint's queue.
    ///
    /// Returns the outcome even when some endpoints failed; check
    /// [`DispatchOutcome::status`]. A failed start-event publish is returned
    /// as [`CoreError::Delivery`] and nothing already pushed is undone.
    pub async fn submit(
        &self,
        scope: Scope,
        tester_id: DbId,
        request: SubmitTask,
    ) -> DispatchResult<DispatchOutcome> {
        let test_suite = require_test_suite(request.test_suite.as_deref())?;
        let endpoints = validate_endpoints(request.endpoint_list.as_deref())?;
        let priority = resolve_priority(request.priority, self.default_priority)?;
        let variables = validate_variables(request.variables.as_ref())?;
        let test_cases = validate_test_cases(request.test_cases.as_ref())?;
        let upload_dir = request.upload_dir.clone().unwrap_or_default();
        if !upload_dir.is_empty() && !is_path_secure(&upload_dir) {
            return Err(CoreError::InvalidArgument(format!(
                "Upload directory {upload_dir} is not allowed"
            ))
            .into());
        }
        let parallel = request.parallelization.unwrap_or(false);

        let test = self.resolve_test(test_suite, scope).await?;

        let template = self
            .store
            .create_task(NewTask {
                test_id: test.id,
                test_suite: test.test_suite.clone(),
                endpoint_list: endpoints.to_vec(),
                priority,
                parallelization: parallel,
                variables: serde_json::Value::Object(variables),
                test_cases,
                tester_id,
                upload_dir,
                organization_id: scope.organization_id,
                team_id: scope.team_id,
                status: TaskStatus::Waiting,
                schedule_date: None,
                comment: None,
            })
            .await
            .map_err(|e| match e {
                StoreError::Rejected(reason) => CoreError::StorageValidation(reason).into(),
                other => DispatchError::from(other),
            })?;

        let mut outcome = DispatchOutcome::default();

        for endpoint in endpoints {
            let unit = if parallel {
                self.store
                    .create_task(NewTask::from_template(&template))
                    .await?
                    .id
            } else {
                template.id
            };

            let key = QueueKey::new(endpoint.as_str(), priority, scope);
            let queue = match self.store.find_queue(&key).await {
                Ok(Some(queue)) => queue,
                Ok(None) => {
                    tracing::error!(
                        task_id = unit,
                        endpoint = %endpoint,
                        priority,
                        organization_id = scope.organization_id,
                        team_id = ?scope.team_id,
                        "Task queue not found"
                    );
                    outcome.failed.push(unit);
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, task_id = unit, endpoint = %endpoint, "Task queue lookup failed");
                    outcome.failed.push(unit);
                    continue;
                }
            };

            // Read before the push: an idle queue starts the task right away.
            if queue.is_idle() {
                outcome.running.push(unit);
            }

            match self.store.push_task(queue.id, unit).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::error!(task_id = unit, queue_id = queue.id, endpoint = %endpoint, "Pushing task to queue failed");
                    outcome.failed.push(unit);
                    continue;
                }
                Err(e) => {
                    tracing::error!(error = %e, task_id = unit, queue_id = queue.id, endpoint = %endpoint, "Pushing task to queue failed");
                    outcome.failed.push(unit);
                    continue;
                }
            }

            let event = TaskEvent::new(scope, EVENT_CODE_START_TASK)
                .with_message(json!({ "address": endpoint, "task_id": unit.to_string() }));
            if let Err(e) = self.publisher.publish(event).await {
                tracing::error!(error = %e, task_id = unit, endpoint = %endpoint, "Publishing start event failed");
                return Err(CoreError::Delivery(format!(
                    "Could not notify workers to start task {unit} on {endpoint}: {e}"
                ))
                .into());
            }

            outcome.succeeded.push(unit);
        }

        if parallel {
            self.store.delete_task(template.id).await?;
        }

        let succeeded = &outcome.succeeded;
        outcome.running.retain(|id| succeeded.contains(id));

        tracing::info!(
            test_suite = %test.test_suite,
            organization_id = scope.organization_id,
            team_id = ?scope.team_id,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            running = outcome.running.len(),
            "Task submitted"
        );
        Ok(outcome)
    }

    /// Ask the worker pool to drop or stop a task.
    ///
    /// The queue is identified by `address` and `priority`; both are
    /// required and checked before the task is looked up. No local queue
    /// state changes.
    pub async fn cancel(&self, scope: Scope, task_id: DbId, request: CancelTask) -> DispatchResult<()> {
        let (address, priority) =
            require_cancel_target(request.address.as_deref(), request.priority)?;
        let task = self.get_task(scope, task_id).await?;

        let event = TaskEvent::new(task.scope(), EVENT_CODE_CANCEL_TASK).with_message(json!({
            "address": address,
            "priority": priority,
            "task_id": task.id.to_string(),
        }));
        self.publisher.publish(event).await.map_err(|e| {
            tracing::error!(error = %e, task_id, address, "Publishing cancel event failed");
            CoreError::Delivery(format!("Could not notify workers to cancel task {task_id}: {e}"))
        })?;

        tracing::info!(task_id, address, priority, "Task cancel requested");
        Ok(())
    }

    /// Look up a task visible from `scope`.
    pub async fn get_task(&self, scope: Scope, task_id: DbId) -> DispatchResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .filter(|task| scope.contains(task.scope()))
            .ok_or_else(|| CoreError::not_found("Task", task_id).into())
    }

    pub async fn update_comment(
        &self,
        scope: Scope,
        task_id: DbId,
        request: UpdateTaskComment,
    ) -> DispatchResult<Task> {
        let comment = require_comment(request.comment.as_deref())?;
        self.get_task(scope, task_id).await?;
        self.store
            .update_comment(task_id, comment)
            .await?
            .ok_or_else(|| CoreError::not_found("Task", task_id).into())
    }

    /// Per-day task counts for `scope`, oldest day first.
    pub async fn statistics(
        &self,
        scope: Scope,
        query: TaskStatsQuery,
        now: Timestamp,
    ) -> DispatchResult<Vec<DayStats>> {
        let (start, end) = resolve_range(query.start_date, query.end_date, now)?;
        let mut days = Vec::new();
        for window in day_windows(start, end)? {
            days.push(self.store.count_day(scope, window).await?);
        }
        Ok(days)
    }

    pub async fn list_test_suites(&self, scope: Scope) -> DispatchResult<Vec<Test>> {
        Ok(self.store.list_tests(scope).await?)
    }

    pub async fn test_cases(&self, scope: Scope, test_suite: &str) -> DispatchResult<TestCases> {
        Ok(self.resolve_test(test_suite, scope).await?.into())
    }

    /// Report for a finished task, ready for the report mailer.
    pub async fn task_report(&self, scope: Scope, task_id: DbId) -> DispatchResult<TaskReport> {
        let task = self.get_task(scope, task_id).await?;
        match task.status() {
            Some(status) if status.is_terminal() => Ok(TaskReport {
                task_id: task.id,
                test_suite: task.test_suite,
                status,
            }),
            _ => Err(CoreError::InvalidArgument(format!("Task {task_id} has not finished")).into()),
        }
    }

    /// The single test definition named `test_suite` in `scope`.
    async fn resolve_test(&self, test_suite: &str, scope: Scope) -> DispatchResult<Test> {
        let mut tests = self.store.find_tests(test_suite, scope).await?;
        match tests.len() {
            0 => Err(CoreError::not_found("Test suite", test_suite).into()),
            1 => Ok(tests.remove(0)),
            _ => Err(CoreError::Conflict("Found duplicate test suites".into()).into()),
        }
    }
}
