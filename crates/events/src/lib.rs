//! Task event envelope, in-process bus and outbound delivery.
//!
//! - [`EventBus`] is an in-process fan-out hub backed by
//!   `tokio::sync::broadcast`.
//! - [`TaskEvent`] is the message the worker pool consumes.
//! - [`EventPublisher`] is the seam the dispatcher publishes through;
//!   [`PgEventPublisher`] makes events durable, [`BusPublisher`] is bus-only.
//! - [`delivery`] sends task reports by email.

pub mod bus;
pub mod delivery;
pub mod publisher;

pub use bus::{EventBus, TaskEvent};
pub use delivery::email::{EmailConfig, EmailError, TaskReportMailer};
pub use publisher::{BusPublisher, EventPublisher, PgEventPublisher, PublishError};
