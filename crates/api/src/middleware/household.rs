//! Household membership and role extractors.
//!
//! Membership is resolved per request from the `{household_id}` path
//! segment; nothing is cached between requests.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tskr_core::error::CoreError;
use tskr_core::roles::HouseholdRole;
use tskr_core::types::DbId;
use tskr_db::HouseholdStore;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller who belongs to the household in the path.
///
/// Rejects with 401 without a valid token and 403 for non-members.
#[derive(Debug, Clone)]
pub struct HouseholdMember {
    pub user_id: DbId,
    pub household_id: DbId,
    pub role: HouseholdRole,
}

impl FromRequestParts<AppState> for HouseholdMember {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let household_id: DbId = params
            .get("household_id")
            .and_then(|raw| raw.parse().ok())
            .ok_or_else(|| AppError::BadRequest("Invalid household id".into()))?;

        let role = state
            .store
            .member_role(household_id, user.user_id)
            .await?
            .ok_or_else(|| {
                tracing::debug!(
                    user_id = user.user_id,
                    household_id,
                    "Rejected non-member"
                );
                AppError::Core(CoreError::Forbidden(
                    "Not a member of this household".into(),
                ))
            })?;

        Ok(HouseholdMember {
            user_id: user.user_id,
            household_id,
            role,
        })
    }
}

/// Requires APPROVER or DICTATOR in the household. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn revert(RequireManager(member): RequireManager) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireManager(pub HouseholdMember);

impl FromRequestParts<AppState> for RequireManager {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let member = HouseholdMember::from_request_parts(parts, state).await?;
        if !member.role.can_manage() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Approver role required".into(),
            )));
        }
        Ok(RequireManager(member))
    }
}
