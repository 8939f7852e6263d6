//! Task dispatch for the webrobot scheduler.
//!
//! [`Dispatcher`] turns a submitted test run into one queue entry per
//! endpoint and notifies the worker pool through an
//! [`EventPublisher`](webrobot_events::EventPublisher). Persistence goes
//! through the [`TaskStore`] seam, backed by Postgres in production and by
//! [`MemoryTaskStore`] in tests.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod store;
pub mod telemetry;

pub use config::DispatchConfig;
pub use dispatcher::{DispatchOutcome, DispatchStatus, Dispatcher};
pub use error::{DispatchError, DispatchResult, StoreError};
pub use store::memory::MemoryTaskStore;
pub use store::postgres::PgTaskStore;
pub use store::TaskStore;
