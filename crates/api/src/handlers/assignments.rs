//! Handlers for assigned tasks.
//!
//! Listing runs the cadence engine per task and only returns tasks the
//! assignee can act on right now.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tskr_core::assignment::{normalize_cadence, validate_assignment_status, ASSIGNMENT_ACTIVE};
use tskr_core::bucket::Bucket;
use tskr_core::cadence::compute_assigned_task_state;
use tskr_core::error::CoreError;
use tskr_core::types::{DbId, Timestamp};
use tskr_db::models::assigned_task::{
    CreateAssignedTask, CreateAssignmentRequest, UpdateAssignmentStatus,
};
use tskr_db::{AssignmentStore, HouseholdStore, Store};
use tskr_events::DashboardEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::household::{HouseholdMember, RequireManager};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation::{validate_request, validation_error};

/// An active assigned task as shown to its assignee.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentEntry {
    pub id: DbId,
    pub preset_label: String,
    pub bucket: String,
    pub points: i64,
    pub assigned_at: Timestamp,
    pub cadence_target: i32,
    pub cadence_interval_minutes: i32,
    pub is_recurring: bool,
    /// Completions in the current window, clamped to the target.
    pub progress: i32,
    pub next_reset_at: Option<Timestamp>,
}

/// Build the caller-facing list of active assignments for `user_id`.
///
/// Paused tasks, tasks whose preset was deleted, and tasks the cadence
/// engine reports inactive are left out. Only completions made after the
/// assignment count toward it.
///
/// `now` must come from [`Store::now`], the clock that stamps completions,
/// or a just-logged completion can fall outside the window.
pub(crate) async fn active_assignments(
    store: &dyn Store,
    household_id: DbId,
    user_id: DbId,
    now: Timestamp,
) -> Result<Vec<AssignmentEntry>, AppError> {
    let tasks = store
        .list_assigned_tasks(household_id, Some(user_id))
        .await?;

    let mut entries = Vec::with_capacity(tasks.len());
    for detail in tasks {
        let task = &detail.task;
        if task.status != ASSIGNMENT_ACTIVE {
            continue;
        }
        let (Some(preset_id), Some(label)) = (task.preset_id, detail.preset_label.as_ref()) else {
            continue;
        };

        let config = task.cadence();
        let since = config.history_start(task.assigned_at, now);
        let completions = store
            .completion_times(user_id, household_id, preset_id, since)
            .await?;
        let state = compute_assigned_task_state(&config, &completions, now);
        if !state.is_active {
            continue;
        }

        let bucket = Bucket::parse_or_default(detail.preset_bucket.as_deref().unwrap_or_default());
        entries.push(AssignmentEntry {
            id: task.id,
            preset_label: label.clone(),
            bucket: bucket.as_str().to_string(),
            points: bucket.points(),
            assigned_at: task.assigned_at,
            cadence_target: config.effective_target(),
            cadence_interval_minutes: task.cadence_interval_minutes,
            is_recurring: task.is_recurring,
            progress: state.display_progress(&config),
            next_reset_at: state.next_reset_at,
        });
    }

    Ok(entries)
}

/// GET /api/v1/households/{household_id}/assignments
///
/// The caller's currently active assignments.
pub async fn list_assignments(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let now = state.store.now().await?;
    let entries = active_assignments(
        state.store.as_ref(),
        member.household_id,
        member.user_id,
        now,
    )
    .await?;

    Ok(Json(DataResponse { data: entries }))
}

/// POST /api/v1/households/{household_id}/assignments
///
/// Assign a preset to a member. One-off assignments are stored with a
/// target of one.
pub async fn create_assignment(
    RequireManager(member): RequireManager,
    State(state): State<AppState>,
    Json(input): Json<CreateAssignmentRequest>,
) -> AppResult<impl IntoResponse> {
    let env = state.config.app_env;
    validate_request(&input, env)?;

    state
        .store
        .find_preset(member.household_id, input.preset_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Task preset",
            id: input.preset_id,
        })?;

    if state
        .store
        .member_role(member.household_id, input.assigned_to_id)
        .await?
        .is_none()
    {
        return Err(validation_error(
            format!(
                "User {} is not a member of this household",
                input.assigned_to_id
            ),
            env,
        ));
    }

    let cadence = normalize_cadence(
        input.cadence_target,
        input.cadence_interval_minutes,
        input.is_recurring,
    );
    let task = state
        .store
        .create_assigned_task(&CreateAssignedTask {
            household_id: member.household_id,
            preset_id: input.preset_id,
            assigned_to_id: input.assigned_to_id,
            assigned_by_id: member.user_id,
            cadence_target: cadence.cadence_target,
            cadence_interval_minutes: cadence.cadence_interval_minutes,
            is_recurring: cadence.is_recurring,
        })
        .await?;

    tracing::info!(
        assigned_by = member.user_id,
        household_id = member.household_id,
        task_id = task.id,
        assigned_to = task.assigned_to_id,
        is_recurring = task.is_recurring,
        "Task assigned",
    );
    state.dashboard_bus.publish(&DashboardEvent::AssignmentsChanged {
        household_id: member.household_id,
        assigned_to_id: task.assigned_to_id,
    });

    Ok((StatusCode::CREATED, Json(DataResponse { data: task })))
}

/// PATCH /api/v1/households/{household_id}/assignments/{id}
///
/// Pause or resume an assignment.
pub async fn update_assignment_status(
    RequireManager(member): RequireManager,
    State(state): State<AppState>,
    Path((_household_id, task_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateAssignmentStatus>,
) -> AppResult<impl IntoResponse> {
    let status = input.status.trim().to_ascii_uppercase();
    validate_assignment_status(&status)
        .map_err(|msg| validation_error(msg, state.config.app_env))?;

    let task = state
        .store
        .update_assigned_task_status(member.household_id, task_id, &status)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Assigned task",
            id: task_id,
        })?;

    tracing::info!(
        user_id = member.user_id,
        household_id = member.household_id,
        task_id,
        status = %task.status,
        "Assignment status updated",
    );
    state.dashboard_bus.publish(&DashboardEvent::AssignmentsChanged {
        household_id: member.household_id,
        assigned_to_id: task.assigned_to_id,
    });

    Ok(Json(DataResponse { data: task }))
}
