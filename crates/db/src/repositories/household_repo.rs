//! Repository for the `households`, `household_members`, and `task_presets` tables.

use sqlx::{PgExecutor, PgPool};
use tskr_core::types::DbId;

use crate::models::household::{CreateTaskPreset, Household, TaskPreset};

/// Column list for households queries.
const HOUSEHOLD_COLUMNS: &str = "id, name, reward_threshold, created_at, updated_at";

/// Column list for task_presets queries.
const PRESET_COLUMNS: &str = "id, household_id, label, bucket, created_at";

/// Read access to households.
pub struct HouseholdRepo;

impl HouseholdRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Household>, sqlx::Error> {
        let query = format!("SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = $1");
        sqlx::query_as::<_, Household>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The household's reward threshold, or `None` if the household does not exist.
    pub async fn reward_threshold<'e, E>(
        executor: E,
        household_id: DbId,
    ) -> Result<Option<i64>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar::<_, i64>("SELECT reward_threshold FROM households WHERE id = $1")
            .bind(household_id)
            .fetch_optional(executor)
            .await
    }
}

/// Read access to household membership.
pub struct MemberRepo;

impl MemberRepo {
    /// The stored role name for a member, or `None` if the user is not a member.
    pub async fn role(
        pool: &PgPool,
        household_id: DbId,
        user_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT role FROM household_members WHERE household_id = $1 AND user_id = $2",
        )
        .bind(household_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}

/// CRUD for task presets.
pub struct PresetRepo;

impl PresetRepo {
    pub async fn create(pool: &PgPool, input: &CreateTaskPreset) -> Result<TaskPreset, sqlx::Error> {
        let query = format!(
            "INSERT INTO task_presets (household_id, label, bucket)
             VALUES ($1, $2, $3)
             RETURNING {PRESET_COLUMNS}"
        );
        sqlx::query_as::<_, TaskPreset>(&query)
            .bind(input.household_id)
            .bind(&input.label)
            .bind(&input.bucket)
            .fetch_one(pool)
            .await
    }

    /// Find a preset scoped to its household.
    pub async fn find(
        pool: &PgPool,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<TaskPreset>, sqlx::Error> {
        let query = format!(
            "SELECT {PRESET_COLUMNS} FROM task_presets WHERE id = $1 AND household_id = $2"
        );
        sqlx::query_as::<_, TaskPreset>(&query)
            .bind(id)
            .bind(household_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, household_id: DbId) -> Result<Vec<TaskPreset>, sqlx::Error> {
        let query = format!(
            "SELECT {PRESET_COLUMNS} FROM task_presets WHERE household_id = $1 ORDER BY label ASC"
        );
        sqlx::query_as::<_, TaskPreset>(&query)
            .bind(household_id)
            .fetch_all(pool)
            .await
    }
}
