//! In-process dashboard event bus.
//!
//! Handlers are plain synchronous callbacks. A handler that returns an error
//! or panics is unsubscribed on the spot; the publisher never sees the
//! failure.
//!
//! Subscribers live in a registry keyed by [`SubscriptionId`] rather than
//! behind a `tokio::sync::broadcast` channel. `publish` can then report how
//! many handlers it reached and remove exactly the one that failed, and a
//! slow subscriber never makes the others lag. Consumers that want a stream,
//! such as the SSE endpoint, forward into their own bounded channel.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tskr_core::types::DbId;

// ---------------------------------------------------------------------------
// DashboardEvent
// ---------------------------------------------------------------------------

/// Something a household dashboard should refresh for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A completion was appended to the ledger.
    PointsLogged {
        household_id: DbId,
        user_id: DbId,
        entry_id: DbId,
        points: i64,
    },
    /// A reward claim committed.
    RewardClaimed {
        household_id: DbId,
        user_id: DbId,
        entry_id: DbId,
        remaining: i64,
    },
    /// A ledger entry was soft-cancelled.
    EntryReverted {
        household_id: DbId,
        user_id: DbId,
        entry_id: DbId,
    },
    /// An assignment was created or changed status.
    AssignmentsChanged {
        household_id: DbId,
        assigned_to_id: DbId,
    },
}

impl DashboardEvent {
    pub fn household_id(&self) -> DbId {
        match self {
            Self::PointsLogged { household_id, .. }
            | Self::RewardClaimed { household_id, .. }
            | Self::EntryReverted { household_id, .. }
            | Self::AssignmentsChanged { household_id, .. } => *household_id,
        }
    }

    /// Stable name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PointsLogged { .. } => "points_logged",
            Self::RewardClaimed { .. } => "reward_claimed",
            Self::EntryReverted { .. } => "entry_reverted",
            Self::AssignmentsChanged { .. } => "assignments_changed",
        }
    }
}

// ---------------------------------------------------------------------------
// DashboardBus
// ---------------------------------------------------------------------------

/// Opaque handle returned by [`DashboardBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// A subscriber callback.
pub type Handler = Arc<dyn Fn(&DashboardEvent) -> anyhow::Result<()> + Send + Sync>;

/// Fan-out bus for [`DashboardEvent`]s.
///
/// ```rust
/// use std::sync::Arc;
/// use tskr_events::{DashboardBus, DashboardEvent};
///
/// let bus = DashboardBus::new();
/// let id = bus.subscribe(Arc::new(|_event: &DashboardEvent| -> anyhow::Result<()> { Ok(()) }));
///
/// let reached = bus.publish(&DashboardEvent::AssignmentsChanged {
///     household_id: 1,
///     assigned_to_id: 2,
/// });
/// assert_eq!(reached, 1);
/// bus.unsubscribe(id);
/// ```
#[derive(Default)]
pub struct DashboardBus {
    next_id: AtomicU64,
    handlers: RwLock<BTreeMap<SubscriptionId, Handler>>,
}

impl DashboardBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays subscribed until [`unsubscribe`](Self::unsubscribe)
    /// is called or it fails.
    pub fn subscribe(&self, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().insert(id, handler);
        tracing::debug!(subscription = id.0, "Dashboard subscriber added");
        id
    }

    /// Remove a handler. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.write().remove(&id).is_some();
        if removed {
            tracing::debug!(subscription = id.0, "Dashboard subscriber removed");
        }
        removed
    }

    /// Deliver `event` to every handler. Returns how many handled it
    /// successfully.
    pub fn publish(&self, event: &DashboardEvent) -> usize {
        // Handlers run without the lock held so they may call back into the bus.
        let snapshot: Vec<(SubscriptionId, Handler)> = self
            .read()
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        let mut reached = 0;
        let mut failed = Vec::new();
        for (id, handler) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => reached += 1,
                Ok(Err(err)) => {
                    tracing::warn!(
                        subscription = id.0,
                        event = event.name(),
                        error = %err,
                        "Dashboard subscriber failed, removing",
                    );
                    failed.push(id);
                }
                Err(_) => {
                    tracing::warn!(
                        subscription = id.0,
                        event = event.name(),
                        "Dashboard subscriber panicked, removing",
                    );
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut handlers = self.write();
            for id in failed {
                handlers.remove(&id);
            }
        }

        reached
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().len()
    }

    // A poisoned lock only means a writer panicked mid-insert/remove; the map
    // itself is still usable.
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<SubscriptionId, Handler>> {
        self.handlers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<SubscriptionId, Handler>> {
        self.handlers.write().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
