//! hn-db
//!
//! Authoritative store access: the shared Postgres pool, a connectivity probe,
//! and the [`MutationGateway`] that turns write intents into statements.
//!
//! Reads of the aggregated post view are NOT served from here; they go to the
//! reactive backend. [`fetch_posts_direct`] exists so DB-backed tests can check
//! what the store actually holds.

pub mod gateway;
pub mod principal;

use std::time::Duration;

use anyhow::{Context, Result};
use hn_config::{DbConfig, ResolvedSecrets};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub use gateway::{DeleteOutcome, MutationGateway, NewPost, PgMutationGateway, PostFields, PostId, UpvoteId};
pub use principal::{ConfiguredPrincipal, Principal, PrincipalSource};

/// Build the shared pool. Connections are checked out per statement and
/// returned on drop, including on error paths.
pub async fn connect(cfg: &DbConfig, secrets: &ResolvedSecrets) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(Duration::from_millis(cfg.acquire_timeout_ms))
        .connect(&secrets.database_url)
        .await
        .context("failed to connect to Postgres")?;

    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_posts_table: bool,
    pub has_upvotes_table: bool,
    pub has_users_table: bool,
}

impl DbStatus {
    pub fn schema_present(&self) -> bool {
        self.has_posts_table && self.has_upvotes_table && self.has_users_table
    }
}

/// Connectivity + schema presence.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let tables: Vec<(String,)> = sqlx::query_as::<_, (String,)>(
        r#"
        select table_name::text
        from information_schema.tables
        where table_schema = 'public'
          and table_name in ('posts', 'upvotes', 'users')
        "#,
    )
    .fetch_all(pool)
    .await
    .context("status table-exists query failed")?;

    let has = |name: &str| tables.iter().any(|(t,)| t == name);
    Ok(DbStatus {
        ok: one == 1,
        has_posts_table: has("posts"),
        has_upvotes_table: has("upvotes"),
        has_users_table: has("users"),
    })
}

/// Insert a user row if `id` is free. Used to seed principals.
pub async fn ensure_user(pool: &PgPool, id: i32, name: &str) -> Result<()> {
    sqlx::query(
        r#"
        insert into users (id, name) values ($1, $2)
        on conflict (id) do nothing
        "#,
    )
    .bind(id)
    .bind(name)
    .execute(pool)
    .await
    .context("ensure_user failed")?;
    Ok(())
}

/// One post as aggregated directly from the store.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub body: String,
    pub author: Option<String>,
    pub upvotes: i64,
}

/// Aggregate posts straight from the store, ordered by upvotes descending.
pub async fn fetch_posts_direct(pool: &PgPool, limit: i64) -> Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(
        r#"
        select
          p.id,
          p.title,
          p.url,
          p.body,
          (select u.name from users u where u.id = p.author_id limit 1) as author,
          (select count(v.id) from upvotes v where v.post_id = p.id) as upvotes
        from posts p
        order by upvotes desc, p.id asc
        limit $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("fetch_posts_direct failed")?;

    Ok(rows)
}

/// Count upvotes referencing `post_id`.
pub async fn count_upvotes(pool: &PgPool, post_id: PostId) -> Result<i64> {
    let (n,): (i64,) =
        sqlx::query_as::<_, (i64,)>("select count(*)::bigint from upvotes where post_id = $1")
            .bind(post_id)
            .fetch_one(pool)
            .await
            .context("count_upvotes failed")?;
    Ok(n)
}
