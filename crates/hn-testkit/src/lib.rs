//! hn-testkit
//!
//! Test doubles for the facade's two external collaborators plus the helper
//! that prepares a scratch Postgres database for DB-backed scenarios.
//!
//! - [`ScriptedReactiveClient`]: canned backend replies, records every call.
//! - [`InMemoryStore`]: authoritative store and reactive backend in one. Writes
//!   are reflected immediately, which lets end-to-end route tests observe the
//!   derived view without real services.
//! - [`testkit_db_pool`]: pool from `HN_DATABASE_URL` with `schema.sql` applied.

pub mod memory;
pub mod scripted;

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, Executor, PgPool};

pub use memory::InMemoryStore;
pub use scripted::{RecordedCall, ScriptedReactiveClient};

pub const ENV_TEST_DB_URL: &str = "HN_DATABASE_URL";

pub const SCHEMA_SQL: &str = include_str!("../schema.sql");

/// Connect to the scratch database named by `HN_DATABASE_URL` and make sure
/// the schema exists.
pub async fn testkit_db_pool() -> Result<PgPool> {
    let url = std::env::var(ENV_TEST_DB_URL)
        .with_context(|| format!("missing env var {ENV_TEST_DB_URL}"))?;

    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .context("failed to connect to test Postgres")?;

    apply_schema(&pool).await?;
    Ok(pool)
}

/// Run `schema.sql`. Statements are idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<()> {
    pool.execute(SCHEMA_SQL)
        .await
        .context("apply schema.sql failed")?;
    Ok(())
}
