//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods over
//! Postgres. Methods that also run inside the claim transaction accept any
//! `PgExecutor` so they work on both `&PgPool` and `&mut PgConnection`.

pub mod assigned_task_repo;
pub mod household_repo;
pub mod point_log_repo;

pub use assigned_task_repo::AssignedTaskRepo;
pub use household_repo::{HouseholdRepo, MemberRepo, PresetRepo};
pub use point_log_repo::PointLogRepo;
