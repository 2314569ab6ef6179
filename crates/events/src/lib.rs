//! Dashboard refresh notifications.
//!
//! - [`DashboardBus`]: in-process publish/subscribe hub, constructed once at
//!   startup and shared via `Arc<DashboardBus>`.
//! - [`DashboardEvent`]: what changed, and in which household.

pub mod bus;

pub use bus::{DashboardBus, DashboardEvent, Handler, SubscriptionId};
