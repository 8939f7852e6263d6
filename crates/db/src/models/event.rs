//! Worker-pool event models.

use serde::Serialize;
use sqlx::FromRow;
use webrobot_core::types::{DbId, Timestamp};

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
    pub code: i32,
    pub message: serde_json::Value,
    pub created_at: Timestamp,
}
