//! Test suite definitions (the `tests` table).

use serde::Serialize;
use sqlx::FromRow;
use webrobot_core::types::{DbId, Timestamp};

/// A row from the `tests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Test {
    pub id: DbId,
    pub test_suite: String,
    pub test_cases: Vec<String>,
    pub variables: serde_json::Value,
    pub author_id: DbId,
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO for the `tests` table.
#[derive(Debug, Clone)]
pub struct NewTest {
    pub test_suite: String,
    pub test_cases: Vec<String>,
    pub variables: serde_json::Value,
    pub author_id: DbId,
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
}

/// The test cases of one suite.
#[derive(Debug, Clone, Serialize)]
pub struct TestCases {
    pub test_suite: String,
    pub test_cases: Vec<String>,
}

impl From<Test> for TestCases {
    fn from(test: Test) -> Self {
        Self {
            test_suite: test.test_suite,
            test_cases: test.test_cases,
        }
    }
}
