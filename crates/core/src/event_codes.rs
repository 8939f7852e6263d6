//! Event codes understood by the worker pool.
//!
//! Carried by every published task event and stored verbatim in the
//! `events.code` column.

/// A task was pushed to an endpoint queue and may be started.
pub const EVENT_CODE_START_TASK: i32 = 200;

/// A queued or running task should be removed or terminated.
pub const EVENT_CODE_CANCEL_TASK: i32 = 201;

/// Human-readable name for an event code (for logs).
pub fn event_code_name(code: i32) -> &'static str {
    match code {
        EVENT_CODE_START_TASK => "start_task",
        EVENT_CODE_CANCEL_TASK => "cancel_task",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_have_names() {
        assert_eq!(event_code_name(EVENT_CODE_START_TASK), "start_task");
        assert_eq!(event_code_name(EVENT_CODE_CANCEL_TASK), "cancel_task");
        assert_eq!(event_code_name(0), "unknown");
    }
}
