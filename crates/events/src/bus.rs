//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the publisher and
//! whoever wants to observe task events in-process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use webrobot_core::event_codes::event_code_name;
use webrobot_core::types::{DbId, Scope};

// ---------------------------------------------------------------------------
// TaskEvent
// ---------------------------------------------------------------------------

/// A command for the worker pool, scoped to an organization and team.
///
/// Built with [`TaskEvent::new`] and [`with_message`](TaskEvent::with_message).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub organization_id: DbId,
    pub team_id: Option<DbId>,

    /// One of the `EVENT_CODE_*` constants in `webrobot_core::event_codes`.
    pub code: i32,

    /// Code-specific JSON payload, e.g. `{"address": ..., "task_id": ...}`.
    pub message: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl TaskEvent {
    /// Create an event with an empty message object.
    pub fn new(scope: Scope, code: i32) -> Self {
        Self {
            organization_id: scope.organization_id,
            team_id: scope.team_id,
            code,
            message: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: serde_json::Value) -> Self {
        self.message = message;
        self
    }

    pub fn scope(&self) -> Scope {
        Scope::new(self.organization_id, self.team_id)
    }

    /// Human-readable code name for log lines.
    pub fn code_name(&self) -> &'static str {
        event_code_name(self.code)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use webrobot_core::event_codes::EVENT_CODE_START_TASK;
/// use webrobot_core::types::Scope;
/// use webrobot_events::bus::{EventBus, TaskEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(TaskEvent::new(Scope::new(1, None), EVENT_CODE_START_TASK));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<TaskEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest unread events are dropped and slow
    /// receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns how many subscribers the event was handed to; zero means it
    /// was dropped.
    pub fn publish(&self, event: TaskEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
