//! Ledger and claim engine.
//!
//! Balances are always re-aggregated from the store. A reward claim runs
//! inside one [`ClaimTx`]: threshold read, balance read, decision, and debit
//! insert either all commit or none do, and concurrent claims for the same
//! user and household are serialized by the store.

use serde::Serialize;
use tskr_core::bucket::{timed_points, Bucket, MAX_TIMED_MINUTES};
use tskr_core::ledger::{
    evaluate_claim, reward_points, KIND_PRESET, KIND_REWARD, KIND_TIMED, REWARD_DESCRIPTION,
    STATUS_APPROVED,
};
use tskr_core::types::{DbId, Timestamp};

use crate::models::point_log::{CreatePointLog, LeaderboardRow, PointLogEntry};
pub use crate::models::point_log::RevertOutcome;
use crate::store::{HouseholdStore, LedgerStore};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The balance does not cover the household's reward threshold.
    #[error("Not enough points to claim: available {available}, threshold {threshold}")]
    NotEnoughPoints { available: i64, threshold: i64 },

    #[error("Household {0} not found")]
    HouseholdNotFound(DbId),

    #[error("Point log {0} not found")]
    EntryNotFound(DbId),

    #[error("Task preset {0} not found")]
    PresetNotFound(DbId),

    #[error("Invalid completion: {0}")]
    InvalidCompletion(String),

    /// Storage failure. Never retried here.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// A committed reward claim.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub entry: PointLogEntry,
    /// Balance after the debit.
    pub remaining: i64,
}

/// What was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A household preset; points come from its bucket.
    Preset { preset_id: DbId },
    /// Free-form timed work; points come from the duration.
    Timed { minutes: i32 },
}

/// A completion to append to the ledger.
#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub user_id: DbId,
    pub household_id: DbId,
    pub completion: Completion,
    /// Overrides the generated description when set and non-blank.
    pub description: Option<String>,
}

/// Sum of approved, non-reverted points for the user in the household.
pub async fn get_available_balance<S>(
    store: &S,
    user_id: DbId,
    household_id: DbId,
) -> Result<i64, LedgerError>
where
    S: LedgerStore + ?Sized,
{
    Ok(store.available_balance(user_id, household_id).await?)
}

/// Redeem the household's reward threshold from the user's balance.
///
/// Fails with [`LedgerError::NotEnoughPoints`] without writing anything when
/// the balance is short.
pub async fn claim_reward<S>(
    store: &S,
    user_id: DbId,
    household_id: DbId,
) -> Result<ClaimOutcome, LedgerError>
where
    S: LedgerStore + ?Sized,
{
    let mut tx = store.begin_claim(user_id, household_id).await?;

    let threshold = tx
        .reward_threshold(household_id)
        .await?
        .ok_or(LedgerError::HouseholdNotFound(household_id))?;
    let available = tx.available_balance(user_id, household_id).await?;

    let remaining = match evaluate_claim(available, threshold) {
        Ok(remaining) => remaining,
        Err(shortfall) => {
            tracing::info!(
                user_id,
                household_id,
                available = shortfall.available,
                threshold = shortfall.threshold,
                "Reward claim rejected"
            );
            return Err(LedgerError::NotEnoughPoints {
                available: shortfall.available,
                threshold: shortfall.threshold,
            });
        }
    };

    let entry = tx
        .insert_point_log(&CreatePointLog {
            user_id,
            household_id,
            kind: KIND_REWARD.to_string(),
            points: reward_points(threshold),
            description: REWARD_DESCRIPTION.to_string(),
            status: STATUS_APPROVED.to_string(),
            preset_id: None,
            duration_minutes: None,
            reward_cost: Some(threshold),
        })
        .await?;
    tx.commit().await?;

    tracing::info!(
        user_id,
        household_id,
        entry_id = entry.id,
        threshold,
        remaining,
        "Reward claimed"
    );

    Ok(ClaimOutcome { entry, remaining })
}

/// Soft-cancel an entry. Reverting twice keeps the first timestamp, and of
/// any number of concurrent reverts exactly one reports `changed`.
pub async fn revert_entry<S>(
    store: &S,
    household_id: DbId,
    entry_id: DbId,
    now: Timestamp,
) -> Result<RevertOutcome, LedgerError>
where
    S: LedgerStore + ?Sized,
{
    let outcome = store
        .revert_point_log(household_id, entry_id, now)
        .await?
        .ok_or(LedgerError::EntryNotFound(entry_id))?;

    if outcome.changed {
        tracing::info!(household_id, entry_id, points = outcome.entry.points, "Point log reverted");
    } else {
        tracing::debug!(household_id, entry_id, "Point log already reverted");
    }

    Ok(outcome)
}

/// Append an approved completion entry.
pub async fn record_completion<S>(
    store: &S,
    input: NewCompletion,
) -> Result<PointLogEntry, LedgerError>
where
    S: HouseholdStore + LedgerStore + ?Sized,
{
    let custom = input
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    let create = match input.completion {
        Completion::Preset { preset_id } => {
            let preset = store
                .find_preset(input.household_id, preset_id)
                .await?
                .ok_or(LedgerError::PresetNotFound(preset_id))?;
            CreatePointLog {
                user_id: input.user_id,
                household_id: input.household_id,
                kind: KIND_PRESET.to_string(),
                points: Bucket::parse_or_default(&preset.bucket).points(),
                description: custom.unwrap_or(preset.label),
                status: STATUS_APPROVED.to_string(),
                preset_id: Some(preset.id),
                duration_minutes: None,
                reward_cost: None,
            }
        }
        Completion::Timed { minutes } => {
            if !(1..=MAX_TIMED_MINUTES).contains(&minutes) {
                return Err(LedgerError::InvalidCompletion(format!(
                    "minutes must be between 1 and {MAX_TIMED_MINUTES}"
                )));
            }
            CreatePointLog {
                user_id: input.user_id,
                household_id: input.household_id,
                kind: KIND_TIMED.to_string(),
                points: timed_points(minutes),
                description: custom.unwrap_or_else(|| format!("Timed work ({minutes} min)")),
                status: STATUS_APPROVED.to_string(),
                preset_id: None,
                duration_minutes: Some(minutes),
                reward_cost: None,
            }
        }
    };

    let entry = store.insert_point_log(&create).await?;
    tracing::info!(
        user_id = entry.user_id,
        household_id = entry.household_id,
        entry_id = entry.id,
        kind = %entry.kind,
        points = entry.points,
        "Completion logged"
    );
    Ok(entry)
}

/// Earned points per member, highest first.
pub async fn leaderboard<S>(store: &S, household_id: DbId) -> Result<Vec<LeaderboardRow>, LedgerError>
where
    S: LedgerStore + ?Sized,
{
    Ok(store.leaderboard(household_id).await?)
}
