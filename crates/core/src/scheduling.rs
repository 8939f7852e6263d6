//! Queue priority bounds and the task status state machine.
//!
//! This module lives in `core` (zero internal deps) so the repository layer,
//! the dispatcher and any worker tooling agree on the same numbers.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Priority constants
// ---------------------------------------------------------------------------

/// Lowest accepted queue priority.
pub const QUEUE_PRIORITY_MIN: i32 = 1;

/// Highest accepted queue priority.
pub const QUEUE_PRIORITY_MAX: i32 = 9;

/// Priority used when a submission does not name one.
pub const QUEUE_PRIORITY_DEFAULT: i32 = 5;

/// Check that `priority` lies in `[QUEUE_PRIORITY_MIN, QUEUE_PRIORITY_MAX]`.
pub fn validate_priority(priority: i32) -> Result<(), CoreError> {
    if (QUEUE_PRIORITY_MIN..=QUEUE_PRIORITY_MAX).contains(&priority) {
        Ok(())
    } else {
        Err(CoreError::OutOfRange(format!(
            "Task priority {priority} is out of range \
             [{QUEUE_PRIORITY_MIN}, {QUEUE_PRIORITY_MAX}]"
        )))
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Task lifecycle status.
///
/// Discriminants match the `task_statuses` seed data (1-based SMALLSERIAL).
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Waiting = 1,
    Running = 2,
    Successful = 3,
    Failed = 4,
}

impl TaskStatus {
    /// Return the database status ID.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Resolve a database status ID.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TaskStatus::Waiting),
            2 => Some(TaskStatus::Running),
            3 => Some(TaskStatus::Successful),
            4 => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    /// Lowercase name as stored by the original task documents.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Running => "running",
            TaskStatus::Successful => "successful",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Successful | TaskStatus::Failed)
    }

    /// Statuses reachable from `self`.
    ///
    /// A waiting task may fail without ever running (cancelled before a
    /// worker picked it up).
    pub fn valid_transitions(self) -> &'static [TaskStatus] {
        match self {
            TaskStatus::Waiting => &[TaskStatus::Running, TaskStatus::Failed],
            TaskStatus::Running => &[TaskStatus::Successful, TaskStatus::Failed],
            TaskStatus::Successful | TaskStatus::Failed => &[],
        }
    }

    pub fn can_transition(self, to: TaskStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a state transition, returning an error for invalid ones.
    pub fn validate_transition(self, to: TaskStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidArgument(format!(
                "Invalid transition: {} -> {}",
                self.as_str(),
                to.as_str()
            )))
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn priority_bounds_are_inclusive() {
        assert!(validate_priority(QUEUE_PRIORITY_MIN).is_ok());
        assert!(validate_priority(QUEUE_PRIORITY_MAX).is_ok());
        assert!(validate_priority(QUEUE_PRIORITY_DEFAULT).is_ok());
    }

    #[test]
    fn priority_outside_bounds_is_range_error() {
        assert_matches!(
            validate_priority(QUEUE_PRIORITY_MIN - 1),
            Err(CoreError::OutOfRange(_))
        );
        assert_matches!(
            validate_priority(QUEUE_PRIORITY_MAX + 1),
            Err(CoreError::OutOfRange(_))
        );
    }

    #[test]
    fn default_priority_is_mid_range() {
        assert_eq!(
            QUEUE_PRIORITY_DEFAULT,
            (QUEUE_PRIORITY_MIN + QUEUE_PRIORITY_MAX) / 2
        );
    }

    #[test]
    fn status_ids_round_trip() {
        for status in [
            TaskStatus::Waiting,
            TaskStatus::Running,
            TaskStatus::Successful,
            TaskStatus::Failed,
        ] {
            assert_eq!(TaskStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(TaskStatus::from_id(0), None);
        assert_eq!(TaskStatus::from_id(5), None);
    }

    #[test]
    fn waiting_moves_to_running_or_failed() {
        assert!(TaskStatus::Waiting.can_transition(TaskStatus::Running));
        assert!(TaskStatus::Waiting.can_transition(TaskStatus::Failed));
        assert!(!TaskStatus::Waiting.can_transition(TaskStatus::Successful));
    }

    #[test]
    fn running_moves_to_terminal_states() {
        assert!(TaskStatus::Running.can_transition(TaskStatus::Successful));
        assert!(TaskStatus::Running.can_transition(TaskStatus::Failed));
        assert!(!TaskStatus::Running.can_transition(TaskStatus::Waiting));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        assert!(TaskStatus::Successful.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Successful.valid_transitions().is_empty());
        assert!(TaskStatus::Failed.valid_transitions().is_empty());
    }

    #[test]
    fn invalid_transition_names_both_states() {
        let err = TaskStatus::Successful
            .validate_transition(TaskStatus::Running)
            .unwrap_err();
        assert!(err.to_string().contains("successful -> running"));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Successful).unwrap();
        assert_eq!(json, "\"successful\"");
    }
}
