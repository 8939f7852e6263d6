//! Repository for the `tests` table.

use sqlx::PgPool;
use webrobot_core::types::Scope;

use crate::models::test_suite::{NewTest, Test};

/// Column list for `tests` queries.
const COLUMNS: &str = "\
    id, test_suite, test_cases, variables, author_id, organization_id, team_id, \
    created_at, updated_at";

/// Provides read/write operations for test suite definitions.
pub struct TestRepo;

impl TestRepo {
    pub async fn create(pool: &PgPool, input: &NewTest) -> Result<Test, sqlx::Error> {
        let query = format!(
            "INSERT INTO tests \
                 (test_suite, test_cases, variables, author_id, organization_id, team_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Test>(&query)
            .bind(&input.test_suite)
            .bind(&input.test_cases)
            .bind(&input.variables)
            .bind(input.author_id)
            .bind(input.organization_id)
            .bind(input.team_id)
            .fetch_one(pool)
            .await
    }

    /// All definitions named `test_suite` visible to `scope`.
    ///
    /// A team-less scope matches every team of the organization, which is
    /// how duplicate definitions across teams surface as a conflict.
    pub async fn find_by_suite(
        pool: &PgPool,
        test_suite: &str,
        scope: Scope,
    ) -> Result<Vec<Test>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tests \
             WHERE test_suite = $1 AND organization_id = $2 \
               AND ($3::BIGINT IS NULL OR team_id = $3) \
             ORDER BY id"
        );
        sqlx::query_as::<_, Test>(&query)
            .bind(test_suite)
            .bind(scope.organization_id)
            .bind(scope.team_id)
            .fetch_all(pool)
            .await
    }

    /// Test suites owned by exactly this organization/team.
    pub async fn list(pool: &PgPool, scope: Scope) -> Result<Vec<Test>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tests \
             WHERE organization_id = $1 AND team_id IS NOT DISTINCT FROM $2 \
             ORDER BY test_suite, id"
        );
        sqlx::query_as::<_, Test>(&query)
            .bind(scope.organization_id)
            .bind(scope.team_id)
            .fetch_all(pool)
            .await
    }
}
