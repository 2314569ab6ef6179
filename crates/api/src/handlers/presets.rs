//! Handlers for household task presets.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tskr_core::bucket::Bucket;
use tskr_db::models::household::{CreatePresetRequest, CreateTaskPreset, TaskPreset};
use tskr_db::HouseholdStore;

use crate::error::AppResult;
use crate::middleware::household::{HouseholdMember, RequireManager};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::validation::{validate_request, validation_error};

/// A preset plus the points one completion is worth.
#[derive(Debug, Serialize)]
pub struct PresetView {
    #[serde(flatten)]
    pub preset: TaskPreset,
    pub points: i64,
}

impl From<TaskPreset> for PresetView {
    fn from(preset: TaskPreset) -> Self {
        let points = Bucket::parse_or_default(&preset.bucket).points();
        Self { preset, points }
    }
}

/// GET /api/v1/households/{household_id}/presets
pub async fn list_presets(
    member: HouseholdMember,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let presets = state.store.list_presets(member.household_id).await?;
    let data: Vec<PresetView> = presets.into_iter().map(PresetView::from).collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/households/{household_id}/presets
///
/// The bucket must name a known effort tier; it is stored upper-cased.
pub async fn create_preset(
    RequireManager(member): RequireManager,
    State(state): State<AppState>,
    Json(input): Json<CreatePresetRequest>,
) -> AppResult<impl IntoResponse> {
    let env = state.config.app_env;
    validate_request(&input, env)?;

    let label = input.label.trim().to_string();
    if label.is_empty() {
        return Err(validation_error("label must not be blank".to_string(), env));
    }

    let bucket = Bucket::parse(&input.bucket).ok_or_else(|| {
        let valid: Vec<&str> = Bucket::ALL.iter().map(|b| b.as_str()).collect();
        validation_error(
            format!(
                "Invalid bucket '{}'. Must be one of: {}",
                input.bucket,
                valid.join(", ")
            ),
            env,
        )
    })?;

    let preset = state
        .store
        .create_preset(&CreateTaskPreset {
            household_id: member.household_id,
            label,
            bucket: bucket.as_str().to_string(),
        })
        .await?;

    tracing::info!(
        user_id = member.user_id,
        household_id = member.household_id,
        preset_id = preset.id,
        bucket = bucket.as_str(),
        "Task preset created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PresetView::from(preset),
        }),
    ))
}
