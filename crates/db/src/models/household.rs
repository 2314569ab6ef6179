//! Household, membership, and task preset models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tskr_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `households` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Household {
    pub id: DbId,
    pub name: String,
    pub reward_threshold: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `household_members` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HouseholdMember {
    pub household_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub joined_at: Timestamp,
}

/// A row from the `task_presets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskPreset {
    pub id: DbId,
    pub household_id: DbId,
    pub label: String,
    pub bucket: String,
    pub created_at: Timestamp,
}

/// DTO for inserting a preset.
#[derive(Debug, Clone)]
pub struct CreateTaskPreset {
    pub household_id: DbId,
    pub label: String,
    pub bucket: String,
}

/// Request body for `POST /households/{household_id}/presets`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePresetRequest {
    #[validate(length(min = 1, max = 120))]
    pub label: String,
    #[validate(length(min = 1, max = 32))]
    pub bucket: String,
}
