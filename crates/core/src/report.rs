//! Text of the task report sent to the tester when a run finishes.

use crate::scheduling::TaskStatus;
use crate::types::DbId;

/// A finished task as seen by the report formatter.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task_id: DbId,
    pub test_suite: String,
    pub status: TaskStatus,
}

pub fn report_subject(report: &TaskReport) -> String {
    format!("Test Report for {}", report.test_suite)
}

/// Plain-text body linking to the HTML log under `result_base_url`.
pub fn report_body(report: &TaskReport, result_base_url: &str) -> String {
    format!(
        "Test suite {} is {}.\n\nFor details please see {}/testresult/{}/log.html",
        report.test_suite,
        report.status,
        result_base_url.trim_end_matches('/'),
        report.task_id
    )
}
