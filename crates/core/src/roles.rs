//! Household membership roles.
//!
//! Role names must match the CHECK constraint on `household_members.role`.

use serde::{Deserialize, Serialize};

pub const ROLE_DICTATOR: &str = "DICTATOR";
pub const ROLE_APPROVER: &str = "APPROVER";
pub const ROLE_DOER: &str = "DOER";

/// A member's role within one household.
///
/// Ordered by privilege: `Doer < Approver < Dictator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HouseholdRole {
    Doer,
    Approver,
    Dictator,
}

impl HouseholdRole {
    pub fn as_str(self) -> &'static str {
        match self {
            HouseholdRole::Dictator => ROLE_DICTATOR,
            HouseholdRole::Approver => ROLE_APPROVER,
            HouseholdRole::Doer => ROLE_DOER,
        }
    }

    /// Parse a stored role name. Unknown names yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            ROLE_DICTATOR => Some(HouseholdRole::Dictator),
            ROLE_APPROVER => Some(HouseholdRole::Approver),
            ROLE_DOER => Some(HouseholdRole::Doer),
            _ => None,
        }
    }

    /// Whether this role may assign tasks, manage presets, and revert entries.
    pub fn can_manage(self) -> bool {
        self >= HouseholdRole::Approver
    }
}

impl std::fmt::Display for HouseholdRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
