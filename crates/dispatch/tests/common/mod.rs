//! Shared fixtures for dispatcher integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use webrobot_core::types::Scope;
use webrobot_db::models::task_queue::{QueueKey, TaskQueue};
use webrobot_db::models::test_suite::{NewTest, Test};
use webrobot_dispatch::{Dispatcher, MemoryTaskStore};
use webrobot_events::{EventPublisher, PublishError, TaskEvent};

/// Records every published event; can be told to fail from the n-th call on.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<TaskEvent>>,
    fail_from: Mutex<Option<usize>>,
    calls: Mutex<usize>,
}

impl RecordingPublisher {
    pub async fn events(&self) -> Vec<TaskEvent> {
        self.events.lock().await.clone()
    }

    /// Fail the publish call with zero-based index `call` and every later one.
    pub async fn fail_from(&self, call: usize) {
        *self.fail_from.lock().await = Some(call);
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
        let mut calls = self.calls.lock().await;
        let call = *calls;
        *calls += 1;
        if matches!(*self.fail_from.lock().await, Some(from) if call >= from) {
            return Err(PublishError::Closed);
        }
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub type TestDispatcher = Dispatcher<Arc<MemoryTaskStore>, Arc<RecordingPublisher>>;

pub struct Harness {
    pub store: Arc<MemoryTaskStore>,
    pub publisher: Arc<RecordingPublisher>,
    pub dispatcher: TestDispatcher,
}

pub fn scope() -> Scope {
    Scope::new(1, Some(10))
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryTaskStore::new());
    let publisher = Arc::new(RecordingPublisher::default());
    let dispatcher = Dispatcher::new(Arc::clone(&store), Arc::clone(&publisher));
    Harness {
        store,
        publisher,
        dispatcher,
    }
}

impl Harness {
    pub async fn add_suite(&self, name: &str, scope: Scope) -> Test {
        self.store
            .add_test(NewTest {
                test_suite: name.to_string(),
                test_cases: vec!["login".into(), "checkout".into()],
                variables: serde_json::json!({}),
                author_id: 99,
                organization_id: scope.organization_id,
                team_id: scope.team_id,
            })
            .await
    }

    pub async fn add_queue(&self, endpoint: &str, priority: i32) -> TaskQueue {
        self.store
            .provision_queue(QueueKey::new(endpoint, priority, scope()))
            .await
    }
}
