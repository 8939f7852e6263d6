/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The organization/team pair every task, test and queue is scoped to.
///
/// Teams are optional: an organization-wide scope has `team_id == None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Scope {
    pub organization_id: DbId,
    pub team_id: Option<DbId>,
}

impl Scope {
    pub fn new(organization_id: DbId, team_id: Option<DbId>) -> Self {
        Self {
            organization_id,
            team_id,
        }
    }

    /// Whether a record owned by `owner` is visible from this scope.
    ///
    /// An organization-wide scope sees every team of its organization; a
    /// team scope sees only its own team.
    pub fn contains(&self, owner: Scope) -> bool {
        self.organization_id == owner.organization_id
            && (self.team_id.is_none() || self.team_id == owner.team_id)
    }
}
