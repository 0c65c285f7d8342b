//! Mutation gateway: write intents to authoritative-store statements.
//!
//! Every statement is parameterized. Each operation is one statement, except
//! delete, which removes dependent upvotes and then the post inside a single
//! transaction (the schema has no cascade). None of these operations touch
//! the reactive backend; reflecting a write into later reads is the backend's
//! job and timing.

use std::future::Future;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;

use crate::Principal;

pub type PostId = i32;
pub type UpvoteId = i32;

/// Body of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub body: String,
}

/// Body of `PUT /posts/{id}`: full replacement of the editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFields {
    pub title: String,
    #[serde(default)]
    pub url: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub upvotes_removed: u64,
    pub post_removed: bool,
}

#[async_trait]
pub trait MutationGateway: Send + Sync {
    async fn create_post(&self, principal: Principal, post: &NewPost) -> Result<PostId>;

    /// Returns whether a row was updated. An unknown id is not an error.
    async fn update_post(&self, id: PostId, fields: &PostFields) -> Result<bool>;

    /// Idempotent: deleting an unknown id succeeds with nothing removed.
    async fn delete_post(&self, id: PostId) -> Result<DeleteOutcome>;

    async fn upvote_post(&self, principal: Principal, id: PostId) -> Result<UpvoteId>;
}

/// Postgres-backed gateway over an injected, shared pool.
#[derive(Debug, Clone)]
pub struct PgMutationGateway {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgMutationGateway {
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(res) => res.with_context(|| format!("{op} failed")),
            Err(_) => Err(anyhow!(
                "{op} timed out after {}ms",
                self.statement_timeout.as_millis()
            )),
        }
    }
}

#[async_trait]
impl MutationGateway for PgMutationGateway {
    async fn create_post(&self, principal: Principal, post: &NewPost) -> Result<PostId> {
        let insert = sqlx::query_scalar::<_, i32>(
            r#"
            insert into posts (title, url, body, author_id)
            values ($1, $2, $3, $4)
            returning id
            "#,
        )
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.body)
        .bind(principal.user_id)
        .fetch_one(&self.pool);

        let id = self.bounded("create_post", insert).await?;
        info!(post_id = id, author_id = principal.user_id, "post created");
        Ok(id)
    }

    async fn update_post(&self, id: PostId, fields: &PostFields) -> Result<bool> {
        let update = sqlx::query(
            r#"
            update posts
            set title = $1, url = $2, body = $3
            where id = $4
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.url)
        .bind(&fields.body)
        .bind(id)
        .execute(&self.pool);

        let res = self.bounded("update_post", update).await?;
        let updated = res.rows_affected() > 0;
        info!(post_id = id, updated, "post updated");
        Ok(updated)
    }

    async fn delete_post(&self, id: PostId) -> Result<DeleteOutcome> {
        let pool = &self.pool;
        let work = async move {
            // Uncommitted `tx` rolls back on drop.
            let mut tx = pool.begin().await?;
            let upvotes = sqlx::query("delete from upvotes where post_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            let posts = sqlx::query("delete from posts where id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tx.commit().await?;
            Ok::<_, sqlx::Error>(DeleteOutcome {
                upvotes_removed: upvotes,
                post_removed: posts > 0,
            })
        };

        let outcome = self.bounded("delete_post", work).await?;
        info!(
            post_id = id,
            upvotes_removed = outcome.upvotes_removed,
            post_removed = outcome.post_removed,
            "post deleted"
        );
        Ok(outcome)
    }

    async fn upvote_post(&self, principal: Principal, id: PostId) -> Result<UpvoteId> {
        let insert = sqlx::query_scalar::<_, i32>(
            r#"
            insert into upvotes (post_id, user_id)
            values ($1, $2)
            returning id
            "#,
        )
        .bind(id)
        .bind(principal.user_id)
        .fetch_one(&self.pool);

        let upvote_id = self.bounded("upvote_post", insert).await?;
        info!(post_id = id, upvote_id, user_id = principal.user_id, "upvote recorded");
        Ok(upvote_id)
    }
}
