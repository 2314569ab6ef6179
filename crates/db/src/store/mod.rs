//! Storage traits the ledger engine and HTTP layer are written against.
//!
//! [`PgStore`](postgres::PgStore) is the production implementation.
//! [`MemoryStore`](memory::MemoryStore) keeps everything in process and is
//! used by tests and single-instance demos. Both report failures as
//! `sqlx::Error` so callers have one error type to map.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use tskr_core::roles::HouseholdRole;
use tskr_core::types::{DbId, Timestamp};

use crate::models::assigned_task::{AssignedTask, AssignedTaskDetail, CreateAssignedTask};
use crate::models::household::{CreateTaskPreset, Household, TaskPreset};
use crate::models::point_log::{CreatePointLog, LeaderboardRow, PointLogEntry, RevertOutcome};

/// Households, membership, and presets.
#[async_trait]
pub trait HouseholdStore: Send + Sync {
    async fn find_household(&self, id: DbId) -> Result<Option<Household>, sqlx::Error>;

    /// The member's role, or `None` if the user does not belong to the household.
    async fn member_role(
        &self,
        household_id: DbId,
        user_id: DbId,
    ) -> Result<Option<HouseholdRole>, sqlx::Error>;

    async fn create_preset(&self, input: &CreateTaskPreset) -> Result<TaskPreset, sqlx::Error>;

    async fn find_preset(
        &self,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<TaskPreset>, sqlx::Error>;

    async fn list_presets(&self, household_id: DbId) -> Result<Vec<TaskPreset>, sqlx::Error>;
}

/// The append-only point ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Sum of approved, non-reverted points. Always re-aggregated.
    async fn available_balance(&self, user_id: DbId, household_id: DbId)
        -> Result<i64, sqlx::Error>;

    async fn insert_point_log(&self, input: &CreatePointLog) -> Result<PointLogEntry, sqlx::Error>;

    async fn find_point_log(
        &self,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<PointLogEntry>, sqlx::Error>;

    /// Newest first.
    async fn list_point_logs(
        &self,
        user_id: DbId,
        household_id: DbId,
        limit: i64,
    ) -> Result<Vec<PointLogEntry>, sqlx::Error>;

    /// Mark an entry reverted unless it already is. Returns the current row
    /// and whether this call set `reverted_at`, or `None` if the entry does
    /// not exist in the household. The check and the write are one atomic
    /// step, so concurrent callers never both see `changed`.
    async fn revert_point_log(
        &self,
        household_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<RevertOutcome>, sqlx::Error>;

    async fn leaderboard(&self, household_id: DbId) -> Result<Vec<LeaderboardRow>, sqlx::Error>;

    /// Open the atomic unit used by reward claims for one `(user, household)`.
    ///
    /// Concurrent claims for the same pair are serialized: a second caller
    /// does not get its transaction until the first commits or drops.
    async fn begin_claim(
        &self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<Box<dyn ClaimTx>, sqlx::Error>;
}

/// An open claim transaction.
///
/// Reads see every entry committed before the transaction was granted, plus
/// this transaction's own writes. Dropping without [`ClaimTx::commit`] rolls
/// back.
#[async_trait]
pub trait ClaimTx: Send {
    async fn reward_threshold(&mut self, household_id: DbId) -> Result<Option<i64>, sqlx::Error>;

    async fn available_balance(
        &mut self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<i64, sqlx::Error>;

    async fn insert_point_log(
        &mut self,
        input: &CreatePointLog,
    ) -> Result<PointLogEntry, sqlx::Error>;

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error>;
}

/// Assigned tasks and the completion history the cadence engine consumes.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    async fn create_assigned_task(
        &self,
        input: &CreateAssignedTask,
    ) -> Result<AssignedTask, sqlx::Error>;

    async fn update_assigned_task_status(
        &self,
        household_id: DbId,
        id: DbId,
        status: &str,
    ) -> Result<Option<AssignedTask>, sqlx::Error>;

    async fn list_assigned_tasks(
        &self,
        household_id: DbId,
        assignee: Option<DbId>,
    ) -> Result<Vec<AssignedTaskDetail>, sqlx::Error>;

    /// Non-reverted completions of `preset_id` by `user_id` created at or after `since`.
    async fn completion_times(
        &self,
        user_id: DbId,
        household_id: DbId,
        preset_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Timestamp>, sqlx::Error>;
}

/// Everything the HTTP layer needs, behind one trait object.
#[async_trait]
pub trait Store: HouseholdStore + LedgerStore + AssignmentStore {
    /// Backend liveness check.
    async fn ping(&self) -> Result<(), sqlx::Error>;

    /// Current time on the clock that stamps `created_at`. Cadence windows
    /// and revert times are taken from here so they never disagree with
    /// stored rows when hosts drift.
    async fn now(&self) -> Result<Timestamp, sqlx::Error>;
}
