pub mod health;
pub mod households;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /households/{household_id}/balance               caller's balance (GET)
/// /households/{household_id}/claim                 claim reward (POST)
/// /households/{household_id}/logs                  list own, log completion (GET, POST)
/// /households/{household_id}/logs/{id}/revert      revert entry (POST, approver+)
/// /households/{household_id}/leaderboard           earned points per member (GET)
/// /households/{household_id}/presets               list, create (create: approver+)
/// /households/{household_id}/assignments           list own active, assign (assign: approver+)
/// /households/{household_id}/assignments/{id}      set status (PATCH, approver+)
/// /households/{household_id}/dashboard             dashboard aggregate (GET)
/// /households/{household_id}/events                dashboard events (SSE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/households/{household_id}", households::router())
}
