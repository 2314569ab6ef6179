//! Shared query parameter handling.

/// Default page size for ledger listings.
pub const DEFAULT_LOG_LIMIT: i64 = 20;

/// Upper bound for any `?limit=`.
pub const MAX_LOG_LIMIT: i64 = 100;

/// Clamp an optional `?limit=` into `1..=MAX_LOG_LIMIT`.
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
}
