use std::sync::Arc;

use tskr_db::Store;
use tskr_events::DashboardBus;

use crate::config::ServerConfig;
use crate::middleware::rate_limit::RateLimiter;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (`PgStore` in production, `MemoryStore` in tests).
    pub store: Arc<dyn Store>,
    pub config: Arc<ServerConfig>,
    /// Dashboard refresh notifications.
    pub dashboard_bus: Arc<DashboardBus>,
    pub rate_limiter: Arc<RateLimiter>,
}
