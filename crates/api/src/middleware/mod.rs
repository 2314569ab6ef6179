//! Request extractors and middleware.
//!
//! - [`auth::AuthUser`] -- the authenticated caller, from a JWT Bearer token.
//! - [`household::HouseholdMember`] -- caller's membership in the household
//!   named by the `{household_id}` path segment.
//! - [`household::RequireManager`] -- membership with APPROVER or DICTATOR role.
//! - [`rate_limit`] -- per-client rate limiting keyed by peer IP.

pub mod auth;
pub mod household;
pub mod rate_limit;
