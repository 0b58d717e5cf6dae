//! Postgres access for the Tribe notification engine.
//!
//! Row models live in [`models`], query code in [`repositories`]. The
//! schema itself (tables plus the preference-resolution stored functions)
//! is owned by the hosted database, not by this crate; the column lists in
//! each repository document what the engine reads and writes.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}
