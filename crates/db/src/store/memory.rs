//! In-process store.
//!
//! All state sits behind one async mutex. A claim transaction holds the
//! mutex from `begin_claim` until it commits or is dropped, and its inserts
//! are buffered and applied only on commit, so claims are serialized and a
//! rolled-back claim leaves nothing behind.
//!
//! Unlike Postgres, no uniqueness constraints are enforced.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tskr_core::ledger::{sum_balance, KIND_REWARD};
use tskr_core::roles::HouseholdRole;
use tskr_core::types::{DbId, Timestamp};

use super::{AssignmentStore, ClaimTx, HouseholdStore, LedgerStore, Store};
use crate::models::assigned_task::{AssignedTask, AssignedTaskDetail, CreateAssignedTask};
use crate::models::household::{CreateTaskPreset, Household, HouseholdMember, TaskPreset};
use crate::models::point_log::{CreatePointLog, LeaderboardRow, PointLogEntry, RevertOutcome};

#[derive(Default)]
struct MemoryState {
    last_id: DbId,
    households: BTreeMap<DbId, Household>,
    members: Vec<HouseholdMember>,
    presets: BTreeMap<DbId, TaskPreset>,
    assigned_tasks: BTreeMap<DbId, AssignedTask>,
    point_logs: Vec<PointLogEntry>,
}

impl MemoryState {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn build_entry(&mut self, input: &CreatePointLog, created_at: Timestamp) -> PointLogEntry {
        PointLogEntry {
            id: self.next_id(),
            user_id: input.user_id,
            household_id: input.household_id,
            kind: input.kind.clone(),
            points: input.points,
            description: input.description.clone(),
            status: input.status.clone(),
            preset_id: input.preset_id,
            duration_minutes: input.duration_minutes,
            reward_cost: input.reward_cost,
            created_at,
            reverted_at: None,
        }
    }
}

fn balance_of<'a>(
    entries: impl Iterator<Item = &'a PointLogEntry>,
    user_id: DbId,
    household_id: DbId,
) -> i64 {
    sum_balance(
        entries
            .filter(|e| e.user_id == user_id && e.household_id == household_id)
            .map(|e| (e.points, e.counts_toward_balance())),
    )
}

/// Store that keeps all rows in memory. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a household. Households are otherwise managed outside this service.
    pub async fn create_household(&self, name: &str, reward_threshold: i64) -> Household {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let household = Household {
            id: state.next_id(),
            name: name.to_string(),
            reward_threshold,
            created_at: now,
            updated_at: now,
        };
        state.households.insert(household.id, household.clone());
        household
    }

    /// Add (or re-role) a member.
    pub async fn add_member(&self, household_id: DbId, user_id: DbId, role: HouseholdRole) {
        let mut state = self.state.lock().await;
        state
            .members
            .retain(|m| !(m.household_id == household_id && m.user_id == user_id));
        state.members.push(HouseholdMember {
            household_id,
            user_id,
            role: role.as_str().to_string(),
            joined_at: Utc::now(),
        });
    }

    /// Append an entry with an explicit creation time.
    pub async fn insert_point_log_at(
        &self,
        input: &CreatePointLog,
        created_at: Timestamp,
    ) -> PointLogEntry {
        let mut state = self.state.lock().await;
        let entry = state.build_entry(input, created_at);
        state.point_logs.push(entry.clone());
        entry
    }
}

#[async_trait]
impl HouseholdStore for MemoryStore {
    async fn find_household(&self, id: DbId) -> Result<Option<Household>, sqlx::Error> {
        Ok(self.state.lock().await.households.get(&id).cloned())
    }

    async fn member_role(
        &self,
        household_id: DbId,
        user_id: DbId,
    ) -> Result<Option<HouseholdRole>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .members
            .iter()
            .find(|m| m.household_id == household_id && m.user_id == user_id)
            .and_then(|m| HouseholdRole::parse(&m.role)))
    }

    async fn create_preset(&self, input: &CreateTaskPreset) -> Result<TaskPreset, sqlx::Error> {
        let mut state = self.state.lock().await;
        let preset = TaskPreset {
            id: state.next_id(),
            household_id: input.household_id,
            label: input.label.clone(),
            bucket: input.bucket.clone(),
            created_at: Utc::now(),
        };
        state.presets.insert(preset.id, preset.clone());
        Ok(preset)
    }

    async fn find_preset(
        &self,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<TaskPreset>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .presets
            .get(&id)
            .filter(|p| p.household_id == household_id)
            .cloned())
    }

    async fn list_presets(&self, household_id: DbId) -> Result<Vec<TaskPreset>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut presets: Vec<TaskPreset> = state
            .presets
            .values()
            .filter(|p| p.household_id == household_id)
            .cloned()
            .collect();
        presets.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(presets)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn available_balance(
        &self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(balance_of(state.point_logs.iter(), user_id, household_id))
    }

    async fn insert_point_log(&self, input: &CreatePointLog) -> Result<PointLogEntry, sqlx::Error> {
        Ok(self.insert_point_log_at(input, Utc::now()).await)
    }

    async fn find_point_log(
        &self,
        household_id: DbId,
        id: DbId,
    ) -> Result<Option<PointLogEntry>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .point_logs
            .iter()
            .find(|e| e.id == id && e.household_id == household_id)
            .cloned())
    }

    async fn list_point_logs(
        &self,
        user_id: DbId,
        household_id: DbId,
        limit: i64,
    ) -> Result<Vec<PointLogEntry>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut entries: Vec<PointLogEntry> = state
            .point_logs
            .iter()
            .filter(|e| e.user_id == user_id && e.household_id == household_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries.truncate(usize::try_from(limit.max(0)).unwrap_or(usize::MAX));
        Ok(entries)
    }

    async fn revert_point_log(
        &self,
        household_id: DbId,
        id: DbId,
        at: Timestamp,
    ) -> Result<Option<RevertOutcome>, sqlx::Error> {
        let mut state = self.state.lock().await;
        let Some(entry) = state
            .point_logs
            .iter_mut()
            .find(|e| e.id == id && e.household_id == household_id)
        else {
            return Ok(None);
        };
        let changed = entry.reverted_at.is_none();
        if changed {
            entry.reverted_at = Some(at);
        }
        Ok(Some(RevertOutcome {
            entry: entry.clone(),
            changed,
        }))
    }

    async fn leaderboard(&self, household_id: DbId) -> Result<Vec<LeaderboardRow>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut rows: Vec<LeaderboardRow> = state
            .members
            .iter()
            .filter(|m| m.household_id == household_id)
            .map(|m| LeaderboardRow {
                user_id: m.user_id,
                role: m.role.clone(),
                earned_points: state
                    .point_logs
                    .iter()
                    .filter(|e| {
                        e.user_id == m.user_id
                            && e.household_id == household_id
                            && e.kind != KIND_REWARD
                            && e.counts_toward_balance()
                    })
                    .map(|e| e.points)
                    .sum(),
            })
            .collect();
        rows.sort_by(|a, b| {
            b.earned_points
                .cmp(&a.earned_points)
                .then(a.user_id.cmp(&b.user_id))
        });
        Ok(rows)
    }

    async fn begin_claim(
        &self,
        _user_id: DbId,
        _household_id: DbId,
    ) -> Result<Box<dyn ClaimTx>, sqlx::Error> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryClaimTx {
            state: guard,
            pending: Vec::new(),
        }))
    }
}

/// Claim transaction owning the state lock. Inserts stay in `pending` until commit.
struct MemoryClaimTx {
    state: OwnedMutexGuard<MemoryState>,
    pending: Vec<PointLogEntry>,
}

#[async_trait]
impl ClaimTx for MemoryClaimTx {
    async fn reward_threshold(&mut self, household_id: DbId) -> Result<Option<i64>, sqlx::Error> {
        Ok(self
            .state
            .households
            .get(&household_id)
            .map(|h| h.reward_threshold))
    }

    async fn available_balance(
        &mut self,
        user_id: DbId,
        household_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        Ok(balance_of(
            self.state.point_logs.iter().chain(self.pending.iter()),
            user_id,
            household_id,
        ))
    }

    async fn insert_point_log(
        &mut self,
        input: &CreatePointLog,
    ) -> Result<PointLogEntry, sqlx::Error> {
        let entry = self.state.build_entry(input, Utc::now());
        self.pending.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let MemoryClaimTx { mut state, pending } = *self;
        state.point_logs.extend(pending);
        Ok(())
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn create_assigned_task(
        &self,
        input: &CreateAssignedTask,
    ) -> Result<AssignedTask, sqlx::Error> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let task = AssignedTask {
            id: state.next_id(),
            household_id: input.household_id,
            preset_id: Some(input.preset_id),
            assigned_to_id: input.assigned_to_id,
            assigned_by_id: input.assigned_by_id,
            cadence_target: input.cadence_target,
            cadence_interval_minutes: input.cadence_interval_minutes,
            is_recurring: input.is_recurring,
            status: tskr_core::assignment::ASSIGNMENT_ACTIVE.to_string(),
            assigned_at: now,
            updated_at: now,
        };
        state.assigned_tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_assigned_task_status(
        &self,
        household_id: DbId,
        id: DbId,
        status: &str,
    ) -> Result<Option<AssignedTask>, sqlx::Error> {
        let mut state = self.state.lock().await;
        let Some(task) = state
            .assigned_tasks
            .get_mut(&id)
            .filter(|t| t.household_id == household_id)
        else {
            return Ok(None);
        };
        task.status = status.to_string();
        task.updated_at = Utc::now();
        Ok(Some(task.clone()))
    }

    async fn list_assigned_tasks(
        &self,
        household_id: DbId,
        assignee: Option<DbId>,
    ) -> Result<Vec<AssignedTaskDetail>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut tasks: Vec<AssignedTaskDetail> = state
            .assigned_tasks
            .values()
            .filter(|t| t.household_id == household_id)
            .filter(|t| assignee.map_or(true, |a| t.assigned_to_id == a))
            .map(|t| {
                let preset = t.preset_id.and_then(|id| state.presets.get(&id));
                AssignedTaskDetail {
                    task: t.clone(),
                    preset_label: preset.map(|p| p.label.clone()),
                    preset_bucket: preset.map(|p| p.bucket.clone()),
                }
            })
            .collect();
        tasks.sort_by(|a, b| {
            a.task
                .assigned_at
                .cmp(&b.task.assigned_at)
                .then(a.task.id.cmp(&b.task.id))
        });
        Ok(tasks)
    }

    async fn completion_times(
        &self,
        user_id: DbId,
        household_id: DbId,
        preset_id: DbId,
        since: Timestamp,
    ) -> Result<Vec<Timestamp>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut times: Vec<Timestamp> = state
            .point_logs
            .iter()
            .filter(|e| {
                e.user_id == user_id
                    && e.household_id == household_id
                    && e.preset_id == Some(preset_id)
                    && !e.is_reverted()
                    && e.created_at >= since
            })
            .map(|e| e.created_at)
            .collect();
        times.sort();
        Ok(times)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }

    async fn now(&self) -> Result<Timestamp, sqlx::Error> {
        Ok(Utc::now())
    }
}
