//! Assigned task models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tskr_core::cadence::CadenceConfig;
use tskr_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `assigned_tasks` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct AssignedTask {
    pub id: DbId,
    pub household_id: DbId,
    pub preset_id: Option<DbId>,
    pub assigned_to_id: DbId,
    pub assigned_by_id: DbId,
    pub cadence_target: i32,
    pub cadence_interval_minutes: i32,
    pub is_recurring: bool,
    pub status: String,
    pub assigned_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AssignedTask {
    pub fn cadence(&self) -> CadenceConfig {
        CadenceConfig {
            cadence_target: self.cadence_target,
            cadence_interval_minutes: self.cadence_interval_minutes,
            is_recurring: self.is_recurring,
        }
    }
}

/// An assigned task joined with its preset's label and bucket.
///
/// Both preset columns are `None` once the preset has been deleted.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssignedTaskDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: AssignedTask,
    pub preset_label: Option<String>,
    pub preset_bucket: Option<String>,
}

/// DTO for inserting an assigned task. Cadence values are already normalized.
#[derive(Debug, Clone)]
pub struct CreateAssignedTask {
    pub household_id: DbId,
    pub preset_id: DbId,
    pub assigned_to_id: DbId,
    pub assigned_by_id: DbId,
    pub cadence_target: i32,
    pub cadence_interval_minutes: i32,
    pub is_recurring: bool,
}

/// Request body for `POST /households/{household_id}/assignments`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssignmentRequest {
    pub preset_id: DbId,
    pub assigned_to_id: DbId,
    #[validate(range(min = 1, max = 1000))]
    pub cadence_target: i32,
    #[validate(range(min = 1, max = 525600))]
    pub cadence_interval_minutes: i32,
    #[serde(default)]
    pub is_recurring: bool,
}

/// Request body for `PATCH /households/{household_id}/assignments/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAssignmentStatus {
    pub status: String,
}
