//! Assigned-task status values and cadence validation.

use crate::cadence::CadenceConfig;

pub const ASSIGNMENT_ACTIVE: &str = "ACTIVE";
pub const ASSIGNMENT_PAUSED: &str = "PAUSED";

/// Statuses an approver may set.
pub const VALID_ASSIGNMENT_STATUSES: &[&str] = &[ASSIGNMENT_ACTIVE, ASSIGNMENT_PAUSED];

/// Validate an assignment status string.
pub fn validate_assignment_status(status: &str) -> Result<(), String> {
    if VALID_ASSIGNMENT_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(format!(
            "Invalid status '{status}'. Must be one of: {}",
            VALID_ASSIGNMENT_STATUSES.join(", ")
        ))
    }
}

/// Normalize cadence input before it is stored.
///
/// One-off tasks are stored with a target of one regardless of what was sent.
pub fn normalize_cadence(
    cadence_target: i32,
    cadence_interval_minutes: i32,
    is_recurring: bool,
) -> CadenceConfig {
    CadenceConfig {
        cadence_target: if is_recurring { cadence_target } else { 1 },
        cadence_interval_minutes,
        is_recurring,
    }
}
