//! Domain layer for the webrobot task scheduler.
//!
//! Holds everything that needs no I/O: identifiers, the error taxonomy,
//! priority bounds and the task status state machine, event codes,
//! statistics day-bucketing, storage path helpers and report formatting.
//! The crate has zero internal dependencies so the repository, event and
//! dispatch layers can all build on it.

pub mod error;
pub mod event_codes;
pub mod paths;
pub mod report;
pub mod scheduling;
pub mod statistics;
pub mod submission;
pub mod types;
