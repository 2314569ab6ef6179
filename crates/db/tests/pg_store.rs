//! `PgStore` against a real database.
//!
//! Each test gets a fresh, migrated database from `#[sqlx::test]`. Covers
//! the SQL balance filter, write-once reverts, the leaderboard join, the
//! flattened assignment listing, the reward-cost CHECK, and claim
//! serialization through the advisory lock.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tskr_core::ledger::{KIND_PRESET, KIND_REWARD, STATUS_APPROVED, STATUS_PENDING};
use tskr_core::types::DbId;
use tskr_db::ledger::{self, LedgerError};
use tskr_db::models::assigned_task::CreateAssignedTask;
use tskr_db::models::household::CreateTaskPreset;
use tskr_db::models::point_log::CreatePointLog;
use tskr_db::{AssignmentStore, HouseholdStore, LedgerStore, PgStore, Store};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(pool: &PgPool, email: &str) -> DbId {
    sqlx::query_scalar("INSERT INTO users (email, display_name) VALUES ($1, $1) RETURNING id")
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn new_household(pool: &PgPool, threshold: i64) -> DbId {
    sqlx::query_scalar(
        "INSERT INTO households (name, reward_threshold) VALUES ('Maple Street', $1) RETURNING id",
    )
    .bind(threshold)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn add_member(pool: &PgPool, household_id: DbId, user_id: DbId, role: &str) {
    sqlx::query("INSERT INTO household_members (household_id, user_id, role) VALUES ($1, $2, $3)")
        .bind(household_id)
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await
        .unwrap();
}

fn entry(user_id: DbId, household_id: DbId, points: i64) -> CreatePointLog {
    CreatePointLog {
        user_id,
        household_id,
        kind: KIND_PRESET.to_string(),
        points,
        description: format!("Chore worth {points}"),
        status: STATUS_APPROVED.to_string(),
        preset_id: None,
        duration_minutes: None,
        reward_cost: None,
    }
}

fn reward(user_id: DbId, household_id: DbId, cost: i64) -> CreatePointLog {
    CreatePointLog {
        kind: KIND_REWARD.to_string(),
        points: -cost,
        reward_cost: Some(cost),
        ..entry(user_id, household_id, 0)
    }
}

/// One household with a single DOER member.
async fn setup(pool: &PgPool, threshold: i64) -> (PgStore, DbId, DbId) {
    let user_id = new_user(pool, "alice@example.com").await;
    let household_id = new_household(pool, threshold).await;
    add_member(pool, household_id, user_id, "DOER").await;
    (PgStore::new(pool.clone()), household_id, user_id)
}

// ---------------------------------------------------------------------------
// Balance and reverts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn balance_counts_only_approved_unreverted_entries(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;

    store.insert_point_log(&entry(alice, hid, 10)).await.unwrap();
    let pending = CreatePointLog {
        status: STATUS_PENDING.to_string(),
        ..entry(alice, hid, 5)
    };
    store.insert_point_log(&pending).await.unwrap();
    let reverted = store.insert_point_log(&entry(alice, hid, 6)).await.unwrap();
    store
        .revert_point_log(hid, reverted.id, Utc::now())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.available_balance(alice, hid).await.unwrap(), 10);
}

#[sqlx::test(migrations = "./migrations")]
async fn revert_changes_the_row_once(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let target = store.insert_point_log(&entry(alice, hid, 6)).await.unwrap();

    let first = store
        .revert_point_log(hid, target.id, Utc::now())
        .await
        .unwrap()
        .unwrap();
    let second = store
        .revert_point_log(hid, target.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap()
        .unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert!(first.entry.reverted_at.is_some());
    assert_eq!(second.entry.reverted_at, first.entry.reverted_at);

    let other_household = new_household(&pool, 50).await;
    assert!(store
        .revert_point_log(other_household, target.id, Utc::now())
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_reverts_report_one_change(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let target = store.insert_point_log(&entry(alice, hid, 6)).await.unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { ledger::revert_entry(&store, hid, target.id, Utc::now()).await })
        })
        .collect();

    let mut changed = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().changed {
            changed += 1;
        }
    }

    assert_eq!(changed, 1);
}

// ---------------------------------------------------------------------------
// Claims
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn concurrent_claims_at_exact_threshold_succeed_once(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    store.insert_point_log(&entry(alice, hid, 50)).await.unwrap();

    let first = {
        let store = store.clone();
        tokio::spawn(async move { ledger::claim_reward(&store, alice, hid).await })
    };
    let second = {
        let store = store.clone();
        tokio::spawn(async move { ledger::claim_reward(&store, alice, hid).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    let failure = results.into_iter().find_map(Result::err).unwrap();
    assert_matches!(
        failure,
        LedgerError::NotEnoughPoints {
            available: 0,
            threshold: 50
        }
    );
    assert_eq!(store.available_balance(alice, hid).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn reward_cost_must_match_points(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let mismatched = CreatePointLog {
        reward_cost: Some(40),
        ..reward(alice, hid, 50)
    };

    let err = store.insert_point_log(&mismatched).await.unwrap_err();

    let sqlx::Error::Database(db_err) = &err else {
        panic!("expected a database error, got {err:?}");
    };
    assert_eq!(db_err.constraint(), Some("ck_point_logs_reward_cost"));
    assert_eq!(store.available_balance(alice, hid).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Leaderboard, assignments and completions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn leaderboard_sums_earned_points_per_member(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let bob = new_user(&pool, "bob@example.com").await;
    let carol = new_user(&pool, "carol@example.com").await;
    add_member(&pool, hid, bob, "APPROVER").await;
    add_member(&pool, hid, carol, "DOER").await;

    store.insert_point_log(&entry(alice, hid, 20)).await.unwrap();
    store.insert_point_log(&reward(alice, hid, 10)).await.unwrap();
    store.insert_point_log(&entry(bob, hid, 5)).await.unwrap();
    let reverted = store.insert_point_log(&entry(bob, hid, 30)).await.unwrap();
    store
        .revert_point_log(hid, reverted.id, Utc::now())
        .await
        .unwrap();

    let rows = store.leaderboard(hid).await.unwrap();

    let ranked: Vec<(DbId, i64)> = rows.iter().map(|r| (r.user_id, r.earned_points)).collect();
    assert_eq!(ranked, vec![(alice, 20), (bob, 5), (carol, 0)]);
    assert_eq!(rows[1].role, "APPROVER");
}

#[sqlx::test(migrations = "./migrations")]
async fn assignment_listing_carries_preset_details(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let bob = new_user(&pool, "bob@example.com").await;
    add_member(&pool, hid, bob, "APPROVER").await;
    let preset = store
        .create_preset(&CreateTaskPreset {
            household_id: hid,
            label: "Dishes".to_string(),
            bucket: "QUICK".to_string(),
        })
        .await
        .unwrap();

    let task = store
        .create_assigned_task(&CreateAssignedTask {
            household_id: hid,
            preset_id: preset.id,
            assigned_to_id: alice,
            assigned_by_id: bob,
            cadence_target: 3,
            cadence_interval_minutes: 1440,
            is_recurring: true,
        })
        .await
        .unwrap();

    let listed = store.list_assigned_tasks(hid, Some(alice)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].task, task);
    assert_eq!(listed[0].preset_label.as_deref(), Some("Dishes"));
    assert_eq!(listed[0].preset_bucket.as_deref(), Some("QUICK"));

    assert!(store.list_assigned_tasks(hid, Some(bob)).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn completion_times_skip_reverted_entries(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let preset = store
        .create_preset(&CreateTaskPreset {
            household_id: hid,
            label: "Laundry".to_string(),
            bucket: "ROUTINE".to_string(),
        })
        .await
        .unwrap();
    let completion = CreatePointLog {
        preset_id: Some(preset.id),
        ..entry(alice, hid, 6)
    };
    store.insert_point_log(&completion).await.unwrap();
    let reverted = store.insert_point_log(&completion).await.unwrap();
    store
        .revert_point_log(hid, reverted.id, Utc::now())
        .await
        .unwrap();

    let since = Utc::now() - Duration::hours(1);
    let times = store
        .completion_times(alice, hid, preset.id, since)
        .await
        .unwrap();

    assert_eq!(times.len(), 1);
    assert!(store
        .completion_times(alice, hid, preset.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn store_clock_never_precedes_stored_rows(pool: PgPool) {
    let (store, hid, alice) = setup(&pool, 50).await;
    let logged = store.insert_point_log(&entry(alice, hid, 3)).await.unwrap();

    let now = store.now().await.unwrap();

    assert!(now >= logged.created_at);
}
