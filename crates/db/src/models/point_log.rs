//! Point ledger models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tskr_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `point_logs` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct PointLogEntry {
    pub id: DbId,
    pub user_id: DbId,
    pub household_id: DbId,
    pub kind: String,
    pub points: i64,
    pub description: String,
    pub status: String,
    pub preset_id: Option<DbId>,
    pub duration_minutes: Option<i32>,
    pub reward_cost: Option<i64>,
    pub created_at: Timestamp,
    pub reverted_at: Option<Timestamp>,
}

impl PointLogEntry {
    pub fn is_reverted(&self) -> bool {
        self.reverted_at.is_some()
    }

    /// Whether this entry contributes to its owner's balance.
    pub fn counts_toward_balance(&self) -> bool {
        tskr_core::ledger::counts_toward_balance(&self.status, self.reverted_at)
    }
}

/// Result of a revert, decided by the same write that sets `reverted_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevertOutcome {
    pub entry: PointLogEntry,
    /// `false` when the entry had already been reverted.
    pub changed: bool,
}

/// DTO for appending a ledger entry. `created_at` is assigned by the store.
#[derive(Debug, Clone)]
pub struct CreatePointLog {
    pub user_id: DbId,
    pub household_id: DbId,
    pub kind: String,
    pub points: i64,
    pub description: String,
    pub status: String,
    pub preset_id: Option<DbId>,
    pub duration_minutes: Option<i32>,
    pub reward_cost: Option<i64>,
}

/// Request body for `POST /households/{household_id}/logs`.
///
/// Exactly one of `preset_id` (a PRESET completion) or `minutes` (a TIMED
/// log) must be set.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LogCompletionRequest {
    pub preset_id: Option<DbId>,
    #[validate(range(min = 1, max = 720))]
    pub minutes: Option<i32>,
    #[validate(length(max = 200))]
    pub description: Option<String>,
}

/// Query parameters for listing ledger entries.
#[derive(Debug, Clone, Deserialize)]
pub struct PointLogListQuery {
    pub limit: Option<i64>,
}

/// One leaderboard line: points earned by a member, excluding reward debits.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct LeaderboardRow {
    pub user_id: DbId,
    pub role: String,
    pub earned_points: i64,
}
