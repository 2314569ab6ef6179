//! Domain logic shared by the persistence and HTTP layers.
//!
//! Everything in this crate is synchronous and free of I/O so it can be
//! unit-tested without a database or runtime.

pub mod assignment;
pub mod bucket;
pub mod cadence;
pub mod error;
pub mod ledger;
pub mod roles;
pub mod types;
