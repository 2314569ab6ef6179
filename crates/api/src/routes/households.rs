//! Household-scoped routes, mounted at `/households/{household_id}`.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{assignments, dashboard, events, ledger, presets};
use crate::state::AppState;

/// ```text
/// GET   /balance              -> get_balance
/// POST  /claim                -> claim_reward
/// GET   /logs                 -> list_logs
/// POST  /logs                 -> log_completion
/// POST  /logs/{id}/revert     -> revert_log
/// GET   /leaderboard          -> leaderboard
/// GET   /presets              -> list_presets
/// POST  /presets              -> create_preset
/// GET   /assignments          -> list_assignments
/// POST  /assignments          -> create_assignment
/// PATCH /assignments/{id}     -> update_assignment_status
/// GET   /dashboard            -> get_dashboard
/// GET   /events               -> stream_events
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/balance", get(ledger::get_balance))
        .route("/claim", post(ledger::claim_reward))
        .route(
            "/logs",
            get(ledger::list_logs).post(ledger::log_completion),
        )
        .route("/logs/{id}/revert", post(ledger::revert_log))
        .route("/leaderboard", get(ledger::leaderboard))
        .route(
            "/presets",
            get(presets::list_presets).post(presets::create_preset),
        )
        .route(
            "/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route(
            "/assignments/{id}",
            patch(assignments::update_assignment_status),
        )
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/events", get(events::stream_events))
}
