//! Repository for the `events` table polled by the worker pool.

use sqlx::PgPool;
use webrobot_core::types::{DbId, Scope};

use crate::models::event::Event;

/// Column list for `events` queries.
const COLUMNS: &str = "id, organization_id, team_id, code, message, created_at";

/// Provides write and read-back operations for worker events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event row, returning the generated ID.
    pub async fn insert(
        pool: &PgPool,
        scope: Scope,
        code: i32,
        message: &serde_json::Value,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO events (organization_id, team_id, code, message) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(scope.organization_id)
        .bind(scope.team_id)
        .bind(code)
        .bind(message)
        .fetch_one(pool)
        .await
    }

    /// List events for a scope, oldest first.
    pub async fn list_for_scope(pool: &PgPool, scope: Scope) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events \
             WHERE organization_id = $1 AND team_id IS NOT DISTINCT FROM $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(scope.organization_id)
            .bind(scope.team_id)
            .fetch_all(pool)
            .await
    }
}
