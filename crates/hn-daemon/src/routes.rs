//! Axum router and all HTTP handlers for hn-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Reads go to the reactive backend, writes go to the
//! mutation gateway, and neither path consults the other.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Json, Router,
};
use hn_db::{NewPost, PostFields, PostId};
use hn_query::{QueryDescriptor, QueryError, QueryName};
use hn_reactive::QueryMode;
use tracing::{debug, error};

use crate::{
    api_types::{PostsQuery, NOT_OK_BODY, OK_BODY},
    error::ApiError,
    negotiation::select_mode,
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Tracing is attached by `main.rs` so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/posts", get(posts_index).post(create_post))
        .route("/posts/:id", put(update_post).delete(delete_post))
        .route("/posts/:id/upvotes", post(upvote_post))
        .route("/healthcheck", get(healthcheck))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /posts
// ---------------------------------------------------------------------------

pub(crate) async fn posts_index(
    State(st): State<Arc<AppState>>,
    query: Result<Query<PostsQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(q) = query.map_err(|rej| QueryError::invalid(QueryName::Posts, rej.body_text()))?;
    let descriptor = match q.limit.as_deref() {
        Some(raw) => QueryDescriptor::posts_from_raw(raw, st.max_limit)?,
        None => QueryDescriptor::posts_bounded(i64::from(st.default_limit), st.max_limit)?,
    };

    let mode = select_mode(&headers);
    debug!(query = %descriptor, mode = mode.as_str(), "posts read");

    match mode {
        QueryMode::Stream => {
            let handle = st.reactive.open_stream(&descriptor).await?;
            Ok(Redirect::temporary(&st.stream_location(handle.as_str())).into_response())
        }
        QueryMode::Snapshot => {
            let snapshot = st.reactive.fetch_snapshot(&descriptor).await?;
            Ok((StatusCode::OK, Json(snapshot.into_values())).into_response())
        }
    }
}

// ---------------------------------------------------------------------------
// POST /posts
// ---------------------------------------------------------------------------

pub(crate) async fn create_post(
    State(st): State<Arc<AppState>>,
    Json(body): Json<NewPost>,
) -> Response {
    match st.gateway.create_post(st.principal.current(), &body).await {
        Ok(_) => ok(),
        Err(e) => not_ok("create_post", None, e),
    }
}

// ---------------------------------------------------------------------------
// PUT /posts/:id
// ---------------------------------------------------------------------------

pub(crate) async fn update_post(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PostId>,
    Json(body): Json<PostFields>,
) -> Response {
    match st.gateway.update_post(id, &body).await {
        Ok(_) => ok(),
        Err(e) => not_ok("update_post", Some(id), e),
    }
}

// ---------------------------------------------------------------------------
// DELETE /posts/:id
// ---------------------------------------------------------------------------

pub(crate) async fn delete_post(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PostId>,
) -> Response {
    match st.gateway.delete_post(id).await {
        Ok(_) => ok(),
        Err(e) => not_ok("delete_post", Some(id), e),
    }
}

// ---------------------------------------------------------------------------
// POST /posts/:id/upvotes
// ---------------------------------------------------------------------------

pub(crate) async fn upvote_post(
    State(st): State<Arc<AppState>>,
    Path(id): Path<PostId>,
) -> Response {
    match st.gateway.upvote_post(st.principal.current(), id).await {
        Ok(_) => ok(),
        Err(e) => not_ok("upvote_post", Some(id), e),
    }
}

// ---------------------------------------------------------------------------
// GET /healthcheck
// ---------------------------------------------------------------------------

pub(crate) async fn healthcheck() -> &'static str {
    OK_BODY
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ok() -> Response {
    (StatusCode::OK, OK_BODY).into_response()
}

fn not_ok(op: &'static str, post_id: Option<PostId>, err: anyhow::Error) -> Response {
    error!(op, post_id, error = %format!("{err:#}"), "mutation failed");
    (StatusCode::INTERNAL_SERVER_ERROR, NOT_OK_BODY).into_response()
}
