//! Postgres-backed store.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tskr_core::roles::HouseholdRole;
use tskr_core::types::{DbId, Timestamp};

use super::{AssignmentStore, ClaimTx, HouseholdStore, LedgerStore, Store};
use crate::models::assigned_task::{AssignedTask, AssignedTaskDetail, CreateAssignedTask};
use crate::models::household::{CreateTaskPreset, Household, TaskPreset};
use crate::models::point_log::{CreatePointLog, LeaderboardRow, PointLogEntry, RevertOutcome};
use crate::repositories::{AssignedTaskRepo, HouseholdRepo, MemberRepo, PointLogRepo, PresetRepo};

/// Store implementation over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Advisory-lock key for the claim critical section of one user in one household.
fn claim_lock_key(user_id: DbId, household_id: DbId) -> String {
    format!("tskr:claim:{household_id}:{user_id}")
}

#[async_trait]
impl HouseholdStore for PgStore {
    async fn find_household(&self, id: DbId) -> Result<Option<Household>, sqlx::Error> {
        HouseholdRepo::find_by_id(&self.pool, id).await
    }

    async fn member_role(
        &self,
        household_id: DbId,
        user_id: DbId,
    ) -> Result<Option<HouseholdRole>, sqlx::Error> {
        let Some(role) = MemberRepo::role(&self.pool, household_id, user_id).await? else {
            return Ok(None);
        };
        let parsed = HouseholdRole::parse(&role);
        if parsed.is_none() {
            tracing::warn!(household_id, user_id, role = %role, "Unknown household role stored");
        }
        Ok(parsed)
    }

    async fn create_preset(&self, input: &CreateTaskPreset) -> Result<TaskPreset, sqlx::Error> {
        PresetRepo::create(&self.pool, input).await
    }

    async fn find_preset(
        &self,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<TaskPreset>, sqlx::Error> {
        PresetRepo::find(&self.pool, household_id, id).await
    }

    async fn list_presets(&self, household_id: DbId) -> Result<Vec<TaskPreset>, sqlx::Error> {
        PresetRepo::list(&self.pool, household_id).await
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn available_balance(
        &self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        PointLogRepo::available_balance(&self.pool, user_id, household_id).await
    }

    async fn insert_point_log(&self, input: &CreatePointLog) -> Result<PointLogEntry, sqlx::Error> {
        PointLogRepo::create(&self.pool, input).await
    }

    async fn find_point_log(
        &self,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<PointLogEntry>, sqlx::Error> {
        PointLogRepo::find(&self.pool, household_id, id).await
    }

    async fn list_point_logs(
        &self,
        user_id: DbId,
        household_id: DbId,
        limit: i64,
    ) -> Result<Vec<PointLogEntry>, sqlx::Error> {
        PointLogRepo::list_for_user(&self.pool, user_id, household_id, limit).await
    }

    async fn revert_point_log(
        &self,
        household_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<RevertOutcome>, sqlx::Error> {
        PointLogRepo::revert(&self.pool, household_id, id, at).await
    }

    async fn leaderboard(&self, household_id: DbId) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        PointLogRepo::leaderboard(&self.pool, household_id).await
    }

    /// Opens a READ COMMITTED transaction and takes a transaction-scoped
    /// advisory lock for the pair before any read. Statements after the lock
    /// take a fresh snapshot, so a waiting claim sees the debit of the claim
    /// it waited for.
    async fn begin_claim(
        &self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<Box<dyn ClaimTx>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(claim_lock_key(user_id, household_id))
            .execute(&mut *tx)
            .await?;
        Ok(Box::new(PgClaimTx { tx }))
    }
}

/// Claim transaction holding the advisory lock until commit or rollback.
struct PgClaimTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ClaimTx for PgClaimTx {
    async fn reward_threshold(&mut self, household_id: DbId) -> Result<Option<i64>, sqlx::Error> {
        HouseholdRepo::reward_threshold(&mut *self.tx, household_id).await
    }

    async fn available_balance(
        &mut self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        PointLogRepo::available_balance(&mut *self.tx, user_id, household_id).await
    }

    async fn insert_point_log(
        &mut self,
        input: &CreatePointLog,
    ) -> Result<PointLogEntry, sqlx::Error> {
        PointLogRepo::create(&mut *self.tx, input).await
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}

#[async_trait]
impl AssignmentStore for PgStore {
    async fn create_assigned_task(
        &self,
        input: &CreateAssignedTask,
    ) -> Result<AssignedTask, sqlx::Error> {
        AssignedTaskRepo::create(&self.pool, input).await
    }

    async fn update_assigned_task_status(
        &self,
        household_id: DbId,
        id: DbId,
        status: &str,
    ) -> Result<Option<AssignedTask>, sqlx::Error> {
        AssignedTaskRepo::update_status(&self.pool, household_id, id, status).await
    }

    async fn list_assigned_tasks(
        &self,
        household_id: DbId,
        assignee: Option<DbId>,
    ) -> Result<Vec<AssignedTaskDetail>, sqlx::Error> {
        AssignedTaskRepo::list_detailed(&self.pool, household_id, assignee).await
    }

    async fn completion_times(
        &self,
        user_id: DbId,
        household_id: DbId,
        preset_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Timestamp>, sqlx::Error> {
        PointLogRepo::completion_times(&self.pool, user_id, household_id, preset_id, since).await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        crate::health_check(&self.pool).await
    }

    async fn now(&self) -> Result<Timestamp, sqlx::Error> {
        sqlx::query_scalar::<_, Timestamp>("SELECT NOW()")
            .fetch_one(&self.pool)
            .await
    }
}
