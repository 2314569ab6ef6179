//! Point-ledger vocabulary and pure balance math.
//!
//! The ledger is an append-only log of signed point entries. A user's
//! available balance is the sum of entries that are approved and not
//! reverted. Persistence and the atomic claim live in `tskr-db`; this module
//! only holds the rules both sides agree on.

use crate::types::Timestamp;

pub const KIND_PRESET: &str = "PRESET";
pub const KIND_TIMED: &str = "TIMED";
pub const KIND_REWARD: &str = "REWARD";

pub const STATUS_APPROVED: &str = "APPROVED";
pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_REJECTED: &str = "REJECTED";

/// Threshold applied when a household does not override it.
pub const DEFAULT_REWARD_THRESHOLD: i64 = 50;

/// Description written on every reward debit.
pub const REWARD_DESCRIPTION: &str = "Reward claimed";

/// User-facing message for a claim against an insufficient balance.
pub const NOT_ENOUGH_POINTS_MESSAGE: &str = "Not enough points to claim";

/// Whether an entry with this status and revert marker contributes to a balance.
pub fn counts_toward_balance(status: &str, reverted_at: Option<Timestamp>) -> bool {
    reverted_at.is_none() && status == STATUS_APPROVED
}

/// Sum the points of every counted entry.
pub fn sum_balance<I>(entries: I) -> i64
where
    I: IntoIterator<Item = (i64, bool)>,
{
    entries
        .into_iter()
        .filter(|(_, counted)| *counted)
        .map(|(points, _)| points)
        .sum()
}

/// A claim that the balance cannot cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shortfall {
    pub available: i64,
    pub threshold: i64,
}

/// Decide a claim. Returns the balance left after the debit.
pub fn evaluate_claim(available: i64, threshold: i64) -> Result<i64, Shortfall> {
    if available < threshold {
        Err(Shortfall {
            available,
            threshold,
        })
    } else {
        Ok(available - threshold)
    }
}

/// Points stored on a reward debit for the given cost.
pub fn reward_points(cost: i64) -> i64 {
    -cost
}
