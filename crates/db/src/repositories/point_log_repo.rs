//! Repository for the `point_logs` table.
//!
//! Balance queries always aggregate from the table; nothing is cached.

use sqlx::{PgExecutor, PgPool};
use tskr_core::ledger::{KIND_REWARD, STATUS_APPROVED};
use tskr_core::types::{DbId, Timestamp};

use crate::models::point_log::{CreatePointLog, LeaderboardRow, PointLogEntry, RevertOutcome};

/// Column list for point_logs queries.
const COLUMNS: &str = "id, user_id, household_id, kind, points, description, status, \
    preset_id, duration_minutes, reward_cost, created_at, reverted_at";

pub struct PointLogRepo;

impl PointLogRepo {
    /// Sum of approved, non-reverted points for a user in a household.
    pub async fn available_balance<'e, E>(
        executor: E,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(points), 0)::BIGINT FROM point_logs
             WHERE user_id = $1 AND household_id = $2
               AND reverted_at IS NULL AND status = $3",
        )
        .bind(user_id)
        .bind(household_id)
        .bind(STATUS_APPROVED)
        .fetch_one(executor)
        .await
    }

    /// Append an entry, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreatePointLog) -> Result<PointLogEntry, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO point_logs
                (user_id, household_id, kind, points, description, status,
                 preset_id, duration_minutes, reward_cost)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PointLogEntry>(&query)
            .bind(input.user_id)
            .bind(input.household_id)
            .bind(&input.kind)
            .bind(input.points)
            .bind(&input.description)
            .bind(&input.status)
            .bind(input.preset_id)
            .bind(input.duration_minutes)
            .bind(input.reward_cost)
            .fetch_one(executor)
            .await
    }

    pub async fn find(
        pool: &PgPool,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<PointLogEntry>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM point_logs WHERE id = $1 AND household_id = $2");
        sqlx::query_as::<_, PointLogEntry>(&query)
            .bind(id)
            .bind(household_id)
            .fetch_optional(pool)
            .await
    }

    /// Most recent entries for a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        household_id: DbId,
        limit: i64,
    ) -> Result<Vec<PointLogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM point_logs
             WHERE user_id = $1 AND household_id = $2
             ORDER BY created_at DESC, id DESC
             LIMIT $3"
        );
        sqlx::query_as::<_, PointLogEntry>(&query)
            .bind(user_id)
            .bind(household_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Set `reverted_at` if it is still NULL.
    ///
    /// Only the statement that flips the row gets it back from `RETURNING`,
    /// so under concurrent reverts exactly one caller sees `changed`. Anyone
    /// else reads the row as it stands. Returns `None` if the entry does not
    /// exist in the household.
    pub async fn revert(
        pool: &PgPool,
        household_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<RevertOutcome>, sqlx::Error> {
        let query = format!(
            "UPDATE point_logs SET reverted_at = $3
             WHERE id = $1 AND household_id = $2 AND reverted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, PointLogEntry>(&query)
            .bind(id)
            .bind(household_id)
            .bind(at)
            .fetch_optional(pool)
            .await?;

        if let Some(entry) = updated {
            return Ok(Some(RevertOutcome {
                entry,
                changed: true,
            }));
        }

        let existing = Self::find(pool, household_id, id).await?;
        Ok(existing.map(|entry| RevertOutcome {
            entry,
            changed: false,
        }))
    }

    /// Earned points per member, highest first. Reward debits are excluded.
    pub async fn leaderboard(
        pool: &PgPool,
        household_id: DbId,
    ) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        sqlx::query_as::<_, LeaderboardRow>(
            "SELECT m.user_id, m.role,
                    COALESCE(SUM(p.points), 0)::BIGINT AS earned_points
             FROM household_members m
             LEFT JOIN point_logs p
               ON p.user_id = m.user_id
              AND p.household_id = m.household_id
              AND p.reverted_at IS NULL
              AND p.status = $2
              AND p.kind <> $3
             WHERE m.household_id = $1
             GROUP BY m.user_id, m.role
             ORDER BY earned_points DESC, m.user_id ASC",
        )
        .bind(household_id)
        .bind(STATUS_APPROVED)
        .bind(KIND_REWARD)
        .fetch_all(pool)
        .await
    }

    /// Creation times of non-reverted completions of a preset by a user,
    /// on or after `since`.
    pub async fn completion_times(
        pool: &PgPool,
        user_id: DbId,
        household_id: DbId,
        preset_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Timestamp>(
            "SELECT created_at FROM point_logs
             WHERE user_id = $1 AND household_id = $2 AND preset_id = $3
               AND reverted_at IS NULL AND created_at >= $4
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(household_id)
        .bind(preset_id)
        .bind(since)
        .fetch_all(pool)
        .await
    }
}
