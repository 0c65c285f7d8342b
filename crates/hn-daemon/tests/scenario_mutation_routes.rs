//! Scenario: mutation endpoints end to end over the in-memory store.
//!
//! `InMemoryStore` is both the mutation gateway and the reactive backend, so
//! a write made through one route is visible to `GET /posts` straight away.

use std::sync::Arc;

use axum::http::{header, Request, StatusCode};
use hn_config::FacadeConfig;
use hn_daemon::{routes, state};
use hn_db::ConfiguredPrincipal;
use hn_testkit::InMemoryStore;
use http_body_util::BodyExt;
use serde_json::json;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn shared_store() -> Arc<InMemoryStore> {
    Arc::new(
        InMemoryStore::new()
            .with_user(1, "ann")
            .with_user(2, "bo"),
    )
}

/// Router acting as `user_id`. Routers built over the same store share data.
fn router_as(store: &Arc<InMemoryStore>, user_id: i32) -> axum::Router {
    let st = Arc::new(state::AppState::new(
        store.clone(),
        store.clone(),
        Arc::new(ConfiguredPrincipal::new(user_id)),
        &FacadeConfig::default(),
    ));
    routes::build_router(st)
}

fn json_req(method: &str, uri: &str, body: serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

fn empty_req(method: &str, uri: &str) -> Request<axum::body::Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

async fn snapshot(router: axum::Router) -> Vec<serde_json::Value> {
    let (status, body) = call(router, empty_req("GET", "/posts")).await;
    assert_eq!(status, StatusCode::OK);
    serde_json::from_slice(&body).expect("snapshot is a JSON array")
}

async fn create(store: &Arc<InMemoryStore>, title: &str) {
    let (status, body) = call(
        router_as(store, 1),
        json_req("POST", "/posts", json!({"title": title, "url": "", "body": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

// ---------------------------------------------------------------------------
// GET /healthcheck
// ---------------------------------------------------------------------------

#[tokio::test]
async fn healthcheck_returns_ok() {
    let store = shared_store();
    let (status, body) = call(router_as(&store, 1), empty_req("GET", "/healthcheck")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

// ---------------------------------------------------------------------------
// POST /posts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_post_appears_in_snapshot_with_zero_upvotes() {
    let store = shared_store();

    let (status, body) = call(
        router_as(&store, 1),
        json_req("POST", "/posts", json!({"title": "T", "url": "U", "body": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");

    let posts = snapshot(router_as(&store, 1)).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "T");
    assert_eq!(posts[0]["url"], "U");
    assert_eq!(posts[0]["body"], "B");
    assert_eq!(posts[0]["author"], "ann");
    assert_eq!(posts[0]["upvotes"], 0);
}

#[tokio::test]
async fn missing_url_defaults_to_empty() {
    let store = shared_store();

    let (status, _) = call(
        router_as(&store, 2),
        json_req("POST", "/posts", json!({"title": "T", "body": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let posts = snapshot(router_as(&store, 1)).await;
    assert_eq!(posts[0]["url"], "");
    assert_eq!(posts[0]["author"], "bo");
}

#[tokio::test]
async fn missing_title_is_rejected_before_the_store() {
    let store = shared_store();

    let (status, _) = call(
        router_as(&store, 1),
        json_req("POST", "/posts", json!({"url": "U", "body": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(snapshot(router_as(&store, 1)).await.is_empty());
}

#[tokio::test]
async fn store_failure_is_500_not_ok() {
    let store = shared_store();
    store.fail_mutations("connection reset");

    let (status, body) = call(
        router_as(&store, 1),
        json_req("POST", "/posts", json!({"title": "T", "url": "U", "body": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], b"not ok");
}

#[tokio::test]
async fn unknown_author_is_500_not_ok() {
    let store = shared_store();

    let (status, body) = call(
        router_as(&store, 99),
        json_req("POST", "/posts", json!({"title": "T", "url": "", "body": "B"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], b"not ok");
}

// ---------------------------------------------------------------------------
// PUT /posts/:id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_replaces_all_three_fields() {
    let store = shared_store();
    create(&store, "old").await;

    let (status, body) = call(
        router_as(&store, 1),
        json_req(
            "PUT",
            "/posts/1",
            json!({"title": "new", "url": "https://x", "body": "fresh"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");

    let posts = snapshot(router_as(&store, 1)).await;
    assert_eq!(posts[0]["title"], "new");
    assert_eq!(posts[0]["url"], "https://x");
    assert_eq!(posts[0]["body"], "fresh");
}

#[tokio::test]
async fn update_of_unknown_id_is_ok() {
    let store = shared_store();

    let (status, body) = call(
        router_as(&store, 1),
        json_req("PUT", "/posts/404", json!({"title": "t", "url": "", "body": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let store = shared_store();
    let (status, _) = call(router_as(&store, 1), empty_req("DELETE", "/posts/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// DELETE /posts/:id
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_post_and_its_upvotes() {
    let store = shared_store();
    create(&store, "a").await;
    create(&store, "b").await;

    for user in [1, 2] {
        let (status, _) = call(router_as(&store, user), empty_req("POST", "/posts/2/upvotes")).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(store.upvote_ids_for(2).len(), 2);

    let (status, body) = call(router_as(&store, 1), empty_req("DELETE", "/posts/2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"ok");

    assert!(!store.post_exists(2));
    assert!(store.upvote_ids_for(2).is_empty());
    assert!(store.post_exists(1));

    let posts = snapshot(router_as(&store, 1)).await;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["id"], 1);
}

#[tokio::test]
async fn delete_of_missing_id_is_ok_and_idempotent() {
    let store = shared_store();
    create(&store, "a").await;

    for _ in 0..2 {
        let (status, body) = call(router_as(&store, 1), empty_req("DELETE", "/posts/1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }
    assert!(!store.post_exists(1));
}

// ---------------------------------------------------------------------------
// POST /posts/:id/upvotes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_upvotes_by_different_users_count_two() {
    let store = shared_store();
    create(&store, "a").await;

    let before = snapshot(router_as(&store, 1)).await[0]["upvotes"].as_i64();
    assert_eq!(before, Some(0));

    for user in [1, 2] {
        let (status, body) =
            call(router_as(&store, user), empty_req("POST", "/posts/1/upvotes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(&body[..], b"ok");
    }

    let after = snapshot(router_as(&store, 1)).await[0]["upvotes"].as_i64();
    assert_eq!(after, Some(2));

    let mut voters = store.upvote_voters(1);
    voters.sort_unstable();
    assert_eq!(voters, vec![1, 2]);
}

#[tokio::test]
async fn upvote_on_missing_post_is_500_not_ok() {
    let store = shared_store();

    let (status, body) = call(router_as(&store, 1), empty_req("POST", "/posts/7/upvotes")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(&body[..], b"not ok");
    assert!(store.upvote_ids_for(7).is_empty());
}
