//! Persistence layer: models, repositories, store boundaries, and adapters.
//!
//! - [`repositories`] -- zero-sized `*Repo` structs issuing SQL against `&PgPool`.
//! - [`store`] -- the async traits the session and workflow services depend on.
//! - [`pg`] -- PostgreSQL implementations of those traits.
//! - [`memory`] -- in-process implementations with the same conditional-update
//!   semantics, used by the test suites.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod repositories;
pub mod store;

pub use error::{LookupError, StoreError};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to confirm the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the versioned schema in `migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
