//! Aggregated dashboard for one member of one household.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tskr_db::ledger;
use tskr_db::models::point_log::PointLogEntry;
use tskr_db::LedgerStore;

use super::assignments::{active_assignments, AssignmentEntry};
use super::ledger::reward_threshold;
use crate::error::AppResult;
use crate::middleware::household::HouseholdMember;
use crate::response::DataResponse;
use crate::state::AppState;

/// Number of ledger entries shown on the dashboard.
const RECENT_LOG_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub available: i64,
    pub threshold: i64,
    pub can_claim: bool,
    pub assignments: Vec<AssignmentEntry>,
    pub recent_logs: Vec<PointLogEntry>,
}

/// GET /api/v1/households/{household_id}/dashboard
pub async fn get_dashboard(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let store = state.store.as_ref();
    let available =
        ledger::get_available_balance(store, member.user_id, member.household_id).await?;
    let threshold = reward_threshold(&state, member.household_id).await?;
    let now = store.now().await?;
    let assignments = active_assignments(store, member.household_id, member.user_id, now).await?;
    let recent_logs = store
        .list_point_logs(member.user_id, member.household_id, RECENT_LOG_LIMIT)
        .await?;

    Ok(Json(DataResponse {
        data: DashboardResponse {
            available,
            threshold,
            can_claim: available >= threshold,
            assignments,
            recent_logs,
        },
    }))
}
