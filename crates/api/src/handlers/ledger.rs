//! Handlers for the point ledger: balance, reward claims, completions,
//! reverts and the household leaderboard.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tskr_core::error::CoreError;
use tskr_core::types::DbId;
use tskr_db::ledger::{self, Completion, NewCompletion};
use tskr_db::models::point_log::{LogCompletionRequest, PointLogListQuery};
use tskr_db::{HouseholdStore, LedgerStore};
use tskr_events::DashboardEvent;

use crate::error::AppResult;
use crate::middleware::household::{HouseholdMember, RequireManager};
use crate::query::clamp_limit;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation::{validate_request, validation_error};

/// Caller's claimable balance against the household threshold.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub available: i64,
    pub threshold: i64,
    pub can_claim: bool,
}

/// Look up the household's reward threshold.
pub(crate) async fn reward_threshold(state: &AppState, household_id: DbId) -> AppResult<i64> {
    let household = state
        .store
        .find_household(household_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Household",
            id: household_id,
        })?;
    Ok(household.reward_threshold)
}

/// GET /api/v1/households/{household_id}/balance
pub async fn get_balance(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let available =
        ledger::get_available_balance(state.store.as_ref(), member.user_id, member.household_id)
            .await?;
    let threshold = reward_threshold(&state, member.household_id).await?;

    Ok(Json(DataResponse {
        data: BalanceResponse {
            available,
            threshold,
            can_claim: available >= threshold,
        },
    }))
}

/// POST /api/v1/households/{household_id}/claim
///
/// Redeems the household threshold. 201 with `{ entry, remaining }`, or 400
/// `NOT_ENOUGH_POINTS` carrying the real `available` and `threshold`.
pub async fn claim_reward(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let outcome =
        ledger::claim_reward(state.store.as_ref(), member.user_id, member.household_id).await?;

    state.dashboard_bus.publish(&DashboardEvent::RewardClaimed {
        household_id: member.household_id,
        user_id: member.user_id,
        entry_id: outcome.entry.id,
        remaining: outcome.remaining,
    });

    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// GET /api/v1/households/{household_id}/logs?limit=
///
/// The caller's most recent entries, newest first. Reverted entries are
/// included and carry `reverted_at`.
pub async fn list_logs(
    member: HouseholdMember,
    State(state): State<AppState>,
    Query(params): Query<PointLogListQuery>,
) -> AppResult<impl IntoResponse> {
    let logs = state
        .store
        .list_point_logs(
            member.user_id,
            member.household_id,
            clamp_limit(params.limit),
        )
        .await?;

    Ok(Json(DataResponse { data: logs }))
}

/// POST /api/v1/households/{household_id}/logs
///
/// Log a completion: either `preset_id` (points from the preset's bucket)
/// or `minutes` (timed work), never both.
pub async fn log_completion(
    member: HouseholdMember,
    State(state): State<AppState>,
    Json(input): Json<LogCompletionRequest>,
) -> AppResult<impl IntoResponse> {
    let env = state.config.app_env;
    validate_request(&input, env)?;

    let completion = match (input.preset_id, input.minutes) {
        (Some(preset_id), None) => Completion::Preset { preset_id },
        (None, Some(minutes)) => Completion::Timed { minutes },
        _ => {
            return Err(validation_error(
                "Provide exactly one of preset_id or minutes".to_string(),
                env,
            ));
        }
    };

    let entry = ledger::record_completion(
        state.store.as_ref(),
        NewCompletion {
            user_id: member.user_id,
            household_id: member.household_id,
            completion,
            description: input.description,
        },
    )
    .await?;

    state.dashboard_bus.publish(&DashboardEvent::PointsLogged {
        household_id: entry.household_id,
        user_id: entry.user_id,
        entry_id: entry.id,
        points: entry.points,
    });

    Ok((StatusCode::CREATED, Json(DataResponse { data: entry })))
}

/// POST /api/v1/households/{household_id}/logs/{id}/revert
///
/// Soft-cancel an entry. Reverting an already-reverted entry returns it
/// unchanged with 200.
pub async fn revert_log(
    RequireManager(member): RequireManager,
    State(state): State<AppState>,
    Path((_household_id, entry_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let now = state.store.now().await?;
    let outcome =
        ledger::revert_entry(state.store.as_ref(), member.household_id, entry_id, now).await?;

    if outcome.changed {
        tracing::info!(
            reverted_by = member.user_id,
            household_id = member.household_id,
            entry_id,
            "Entry reverted via API",
        );
        state.dashboard_bus.publish(&DashboardEvent::EntryReverted {
            household_id: member.household_id,
            user_id: outcome.entry.user_id,
            entry_id,
        });
    }

    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/households/{household_id}/leaderboard
pub async fn leaderboard(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let rows = ledger::leaderboard(state.store.as_ref(), member.household_id).await?;
    Ok(Json(DataResponse { data: rows }))
}

