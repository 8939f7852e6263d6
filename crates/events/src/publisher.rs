//! The publish seam between the dispatcher and the worker pool.
//!
//! Workers consume task events from the `events` table, so a publish only
//! counts as delivered once the row is written. [`PgEventPublisher`] does
//! that and then mirrors the event onto the in-process [`EventBus`].

use std::sync::Arc;

use async_trait::async_trait;
use webrobot_db::repositories::EventRepo;
use webrobot_db::DbPool;

use crate::bus::{EventBus, TaskEvent};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event store error: {0}")]
    Database(#[from] sqlx::Error),

    /// Nobody is listening on the channel the event was sent to.
    #[error("Event channel closed: no consumer is listening")]
    Closed,
}

// ---------------------------------------------------------------------------
// EventPublisher
// ---------------------------------------------------------------------------

/// Delivers a [`TaskEvent`] to the worker pool.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError>;
}

#[async_trait]
impl<T: EventPublisher + ?Sized> EventPublisher for Arc<T> {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
        (**self).publish(event).await
    }
}

// ---------------------------------------------------------------------------
// PgEventPublisher
// ---------------------------------------------------------------------------

/// Durable publisher: writes to `events`, then fans out on the bus.
pub struct PgEventPublisher {
    pool: DbPool,
    bus: Arc<EventBus>,
}

impl PgEventPublisher {
    pub fn new(pool: DbPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }
}

#[async_trait]
impl EventPublisher for PgEventPublisher {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
        let id = EventRepo::insert(&self.pool, event.scope(), event.code, &event.message).await?;
        tracing::debug!(
            event_id = id,
            code = event.code_name(),
            organization_id = event.organization_id,
            team_id = ?event.team_id,
            "Task event persisted"
        );
        // In-process observers are optional; the row is what workers read.
        self.bus.publish(event);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// BusPublisher
// ---------------------------------------------------------------------------

/// Bus-only publisher for deployments where workers live in-process.
///
/// Unlike [`EventBus::publish`], an event nobody receives is an error here:
/// with no subscriber there is no worker to start the task.
pub struct BusPublisher {
    bus: Arc<EventBus>,
}

impl BusPublisher {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl EventPublisher for BusPublisher {
    async fn publish(&self, event: TaskEvent) -> Result<(), PublishError> {
        let code = event.code_name();
        match self.bus.publish(event) {
            0 => Err(PublishError::Closed),
            receivers => {
                tracing::debug!(code, receivers, "Task event published");
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use webrobot_core::event_codes::EVENT_CODE_START_TASK;
    use webrobot_core::types::Scope;

    use super::*;

    fn start_event() -> TaskEvent {
        TaskEvent::new(Scope::new(1, Some(2)), EVENT_CODE_START_TASK)
            .with_message(serde_json::json!({"address": "e1", "task_id": "9"}))
    }

    #[tokio::test]
    async fn bus_publisher_delivers_to_subscriber() {
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let publisher = BusPublisher::new(Arc::clone(&bus));

        publisher.publish(start_event()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.code, EVENT_CODE_START_TASK);
        assert_eq!(received.scope(), Scope::new(1, Some(2)));
        assert_eq!(received.message["task_id"], "9");
    }

    #[tokio::test]
    async fn bus_publisher_without_subscriber_is_closed() {
        let publisher = BusPublisher::new(Arc::new(EventBus::default()));
        let result = publisher.publish(start_event()).await;
        assert_matches!(result, Err(PublishError::Closed));
    }

    #[tokio::test]
    async fn arc_publisher_forwards() {
        let bus = Arc::new(EventBus::default());
        let _rx = bus.subscribe();
        let publisher: Arc<dyn EventPublisher> = Arc::new(BusPublisher::new(bus));
        assert!(publisher.publish(start_event()).await.is_ok());
    }

    #[test]
    fn closed_error_message() {
        assert_eq!(
            PublishError::Closed.to_string(),
            "Event channel closed: no consumer is listening"
        );
    }
}
