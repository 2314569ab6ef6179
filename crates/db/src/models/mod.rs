//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO used by the store traits for inserts
//! - `Deserialize` + `Validate` request bodies accepted by the API

pub mod assigned_task;
pub mod household;
pub mod point_log;
