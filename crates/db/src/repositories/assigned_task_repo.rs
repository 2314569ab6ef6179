//! Repository for the `assigned_tasks` table.

use sqlx::PgPool;
use tskr_core::types::DbId;

use crate::models::assigned_task::{AssignedTask, AssignedTaskDetail, CreateAssignedTask};

/// Column list for assigned_tasks queries.
const COLUMNS: &str = "id, household_id, preset_id, assigned_to_id, assigned_by_id, \
    cadence_target, cadence_interval_minutes, is_recurring, status, assigned_at, updated_at";

pub struct AssignedTaskRepo;

impl AssignedTaskRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateAssignedTask,
    ) -> Result<AssignedTask, sqlx::Error> {
        let query = format!(
            "INSERT INTO assigned_tasks
                (household_id, preset_id, assigned_to_id, assigned_by_id,
                 cadence_target, cadence_interval_minutes, is_recurring)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssignedTask>(&query)
            .bind(input.household_id)
            .bind(input.preset_id)
            .bind(input.assigned_to_id)
            .bind(input.assigned_by_id)
            .bind(input.cadence_target)
            .bind(input.cadence_interval_minutes)
            .bind(input.is_recurring)
            .fetch_one(pool)
            .await
    }

    /// Change the status. Returns `None` if the task is not in the household.
    pub async fn update_status(
        pool: &PgPool,
        household_id: DbId,
        id: DbId,
        status: &str,
    ) -> Result<Option<AssignedTask>, sqlx::Error> {
        let query = format!(
            "UPDATE assigned_tasks SET status = $3, updated_at = NOW()
             WHERE id = $1 AND household_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AssignedTask>(&query)
            .bind(id)
            .bind(household_id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Tasks in a household joined with preset details, oldest assignment first.
    /// Optionally restricted to one assignee.
    pub async fn list_detailed(
        pool: &PgPool,
        household_id: DbId,
        assignee: Option<DbId>,
    ) -> Result<Vec<AssignedTaskDetail>, sqlx::Error> {
        sqlx::query_as::<_, AssignedTaskDetail>(
            "SELECT t.id, t.household_id, t.preset_id, t.assigned_to_id, t.assigned_by_id,
                    t.cadence_target, t.cadence_interval_minutes, t.is_recurring, t.status,
                    t.assigned_at, t.updated_at,
                    p.label AS preset_label, p.bucket AS preset_bucket
             FROM assigned_tasks t
             LEFT JOIN task_presets p ON p.id = t.preset_id
             WHERE t.household_id = $1
               AND ($2::BIGINT IS NULL OR t.assigned_to_id = $2)
             ORDER BY t.assigned_at ASC, t.id ASC",
        )
        .bind(household_id)
        .bind(assignee)
        .fetch_all(pool)
        .await
    }
}
