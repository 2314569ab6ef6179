//! Persistence layer: row models, Postgres repositories, the storage traits
//! the rest of the service is written against, and the ledger engine.

use sqlx::postgres::PgPoolOptions;

pub mod ledger;
pub mod models;
pub mod repositories;
pub mod store;

pub type DbPool = sqlx::PgPool;

pub use store::memory::MemoryStore;
pub use store::postgres::PgStore;
pub use store::{AssignmentStore, ClaimTx, HouseholdStore, LedgerStore, Store};

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap round-trip used by startup checks and the health endpoint.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations in `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
