//! In-memory authoritative store that also serves the derived posts view.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use hn_db::{DeleteOutcome, MutationGateway, NewPost, PostFields, PostId, Principal, UpvoteId};
use hn_query::{QueryDescriptor, QueryName, QueryParam};
use hn_reactive::{
    QueryMode, ReactiveClient, ReactiveError, ReactiveResult, Snapshot, SnapshotRow, StreamHandle,
};
use serde_json::json;

#[derive(Debug, Clone)]
struct StoredPost {
    title: String,
    url: String,
    body: String,
    author_id: i32,
}

#[derive(Debug, Clone, Copy)]
struct StoredUpvote {
    post_id: PostId,
    user_id: i32,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, String>,
    posts: BTreeMap<PostId, StoredPost>,
    upvotes: BTreeMap<UpvoteId, StoredUpvote>,
    next_post_id: PostId,
    next_upvote_id: UpvoteId,
    next_stream: u64,
    fail_mutations: Option<String>,
}

/// Mirrors the Postgres schema's foreign keys: posts need an existing author,
/// upvotes need an existing post and user.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, id: i32, name: &str) -> Self {
        if let Ok(mut t) = self.tables.lock() {
            t.users.insert(id, name.to_string());
        }
        self
    }

    /// Every subsequent mutation fails with `msg`, as a broken store would.
    pub fn fail_mutations(&self, msg: &str) {
        if let Ok(mut t) = self.tables.lock() {
            t.fail_mutations = Some(msg.to_string());
        }
    }

    pub fn post_exists(&self, id: PostId) -> bool {
        self.tables
            .lock()
            .map(|t| t.posts.contains_key(&id))
            .unwrap_or(false)
    }

    pub fn upvote_ids_for(&self, post_id: PostId) -> Vec<UpvoteId> {
        self.tables
            .lock()
            .map(|t| {
                t.upvotes
                    .iter()
                    .filter(|(_, v)| v.post_id == post_id)
                    .map(|(id, _)| *id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn upvote_voters(&self, post_id: PostId) -> Vec<i32> {
        self.tables
            .lock()
            .map(|t| {
                t.upvotes
                    .values()
                    .filter(|v| v.post_id == post_id)
                    .map(|v| v.user_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        let t = self
            .tables
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        if let Some(msg) = &t.fail_mutations {
            bail!("{msg}");
        }
        Ok(t)
    }

    /// Posts ordered by upvotes descending, then id, as the backend orders them.
    fn posts_view(&self, limit: usize) -> Snapshot {
        let Ok(t) = self.tables.lock() else {
            return Snapshot::default();
        };

        let mut rows: Vec<(PostId, i64, &StoredPost)> = t
            .posts
            .iter()
            .map(|(id, p)| {
                let n = t.upvotes.values().filter(|v| v.post_id == *id).count() as i64;
                (*id, n, p)
            })
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let rows = rows
            .into_iter()
            .take(limit)
            .map(|(id, upvotes, p)| {
                let value = json!({
                    "id": id,
                    "title": p.title,
                    "url": p.url,
                    "body": p.body,
                    "author": t.users.get(&p.author_id),
                    "upvotes": upvotes,
                });
                SnapshotRow {
                    id: json!(id),
                    value: value.as_object().cloned().unwrap_or_default(),
                }
            })
            .collect();

        Snapshot { rows }
    }
}

#[async_trait]
impl MutationGateway for InMemoryStore {
    async fn create_post(&self, principal: Principal, post: &NewPost) -> Result<PostId> {
        let mut t = self.lock()?;
        if !t.users.contains_key(&principal.user_id) {
            bail!("create_post failed: author {} does not exist", principal.user_id);
        }
        t.next_post_id += 1;
        let id = t.next_post_id;
        t.posts.insert(
            id,
            StoredPost {
                title: post.title.clone(),
                url: post.url.clone(),
                body: post.body.clone(),
                author_id: principal.user_id,
            },
        );
        Ok(id)
    }

    async fn update_post(&self, id: PostId, fields: &PostFields) -> Result<bool> {
        let mut t = self.lock()?;
        match t.posts.get_mut(&id) {
            Some(p) => {
                p.title = fields.title.clone();
                p.url = fields.url.clone();
                p.body = fields.body.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: PostId) -> Result<DeleteOutcome> {
        let mut t = self.lock()?;
        let before = t.upvotes.len();
        t.upvotes.retain(|_, v| v.post_id != id);
        let upvotes_removed = (before - t.upvotes.len()) as u64;
        let post_removed = t.posts.remove(&id).is_some();
        Ok(DeleteOutcome {
            upvotes_removed,
            post_removed,
        })
    }

    async fn upvote_post(&self, principal: Principal, id: PostId) -> Result<UpvoteId> {
        let mut t = self.lock()?;
        if !t.posts.contains_key(&id) {
            bail!("upvote_post failed: post {id} does not exist");
        }
        if !t.users.contains_key(&principal.user_id) {
            bail!("upvote_post failed: user {} does not exist", principal.user_id);
        }
        t.next_upvote_id += 1;
        let upvote_id = t.next_upvote_id;
        t.upvotes.insert(
            upvote_id,
            StoredUpvote {
                post_id: id,
                user_id: principal.user_id,
            },
        );
        Ok(upvote_id)
    }
}

#[async_trait]
impl ReactiveClient for InMemoryStore {
    async fn request(
        &self,
        descriptor: &QueryDescriptor,
        mode: QueryMode,
    ) -> Result<ReactiveResult, ReactiveError> {
        match mode {
            QueryMode::Snapshot => {
                let snapshot = match (descriptor.name(), descriptor.param()) {
                    (QueryName::Posts, QueryParam::Limit(n)) => self.posts_view(*n as usize),
                };
                Ok(ReactiveResult::Snapshot(snapshot))
            }
            QueryMode::Stream => {
                let n = {
                    let mut t = self
                        .tables
                        .lock()
                        .map_err(|_| ReactiveError::Unavailable("store lock poisoned".to_string()))?;
                    t.next_stream += 1;
                    t.next_stream
                };
                let handle = StreamHandle::parse(&format!("mem-{}-{n}", descriptor.name()))?;
                Ok(ReactiveResult::StreamHandle(handle))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str) -> NewPost {
        NewPost {
            title: title.to_string(),
            url: String::new(),
            body: "b".to_string(),
        }
    }

    #[tokio::test]
    async fn derived_view_orders_by_upvotes_and_limits() {
        let store = InMemoryStore::new().with_user(1, "ann").with_user(2, "bo");
        let me = Principal { user_id: 1 };
        let a = store.create_post(me, &post("a")).await.unwrap();
        let b = store.create_post(me, &post("b")).await.unwrap();
        store.upvote_post(Principal { user_id: 2 }, b).await.unwrap();

        let d = QueryDescriptor::posts(10).unwrap();
        let values = store.fetch_snapshot(&d).await.unwrap().into_values();
        assert_eq!(values[0]["id"], b);
        assert_eq!(values[0]["upvotes"], 1);
        assert_eq!(values[0]["author"], "ann");
        assert_eq!(values[1]["id"], a);

        let d1 = QueryDescriptor::posts(1).unwrap();
        assert_eq!(store.fetch_snapshot(&d1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let store = InMemoryStore::new().with_user(1, "ann");
        assert!(store.upvote_post(Principal { user_id: 1 }, 99).await.is_err());
        assert!(store
            .create_post(Principal { user_id: 7 }, &post("x"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn failing_store_rejects_mutations() {
        let store = InMemoryStore::new().with_user(1, "ann");
        store.fail_mutations("connection refused");
        let err = store.delete_post(1).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }
}
