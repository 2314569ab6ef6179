//! Primitive aliases used across the workspace.

/// Row ids. Every table uses `BIGSERIAL` keys.
pub type DbId = i64;

/// Wall-clock instant, always in UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
