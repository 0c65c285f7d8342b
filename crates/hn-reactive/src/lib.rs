//! hn-reactive
//!
//! Client side of the reactive backend contract.
//!
//! The backend serves every named query two ways under one base route:
//!
//! | Mode     | Request                          | Response                     |
//! |----------|----------------------------------|------------------------------|
//! | snapshot | `POST {base}/snapshot/{name}`    | `[[id, [valueObject]], ...]` |
//! | stream   | `POST {base}/streams/{name}`     | bare token string            |
//!
//! Both requests carry the descriptor's parameter as the JSON body. The two
//! response shapes are normalized into [`ReactiveResult`] so callers match on
//! a tagged variant instead of sniffing payloads.

pub mod envelope;
pub mod error;
pub mod http;

use std::fmt;

use async_trait::async_trait;
use hn_query::QueryDescriptor;
use serde_json::{Map, Value};

pub use envelope::{decode_snapshot, decode_stream_handle};
pub use error::ReactiveError;
pub use http::HttpReactiveClient;

/// Which of the two sibling endpoints a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryMode {
    Snapshot,
    Stream,
}

impl QueryMode {
    /// Backend path segment for this mode.
    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryMode::Snapshot => "snapshot",
            QueryMode::Stream => "streams",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Snapshot => "snapshot",
            QueryMode::Stream => "stream",
        }
    }
}

/// One row of a snapshot: the backend's key and its single value object.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub id: Value,
    pub value: Map<String, Value>,
}

/// Point-in-time result of a named query, in backend order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub rows: Vec<SnapshotRow>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Flatten to the client-visible shape: one object per row, in order.
    ///
    /// Value objects normally carry their own `id`; when one does not, the
    /// row key is inserted under `id`. An existing `id` is never overwritten.
    pub fn into_values(self) -> Vec<Value> {
        self.rows
            .into_iter()
            .map(|row| {
                let SnapshotRow { id, mut value } = row;
                value.entry("id").or_insert(id);
                Value::Object(value)
            })
            .collect()
    }
}

/// Opaque token naming a live stream on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamHandle(String);

impl StreamHandle {
    /// Validate a token for embedding in a redirect path.
    ///
    /// Only URI-unreserved ASCII is allowed (`A-Z a-z 0-9 - . _ ~`), so the
    /// token goes into `Location` verbatim with no escaping.
    pub fn parse(token: &str) -> Result<Self, ReactiveError> {
        if token.is_empty() {
            return Err(ReactiveError::Decode("stream token is empty".to_string()));
        }
        if let Some(c) = token
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
        {
            return Err(ReactiveError::Decode(format!(
                "stream token contains forbidden character {c:?}"
            )));
        }
        Ok(StreamHandle(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized backend reply. Exactly one variant per call.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactiveResult {
    Snapshot(Snapshot),
    StreamHandle(StreamHandle),
}

/// Reads named queries from the reactive backend.
///
/// Implementors provide [`ReactiveClient::request`]; the typed helpers are
/// derived from it so snapshot and stream share a single request path.
#[async_trait]
pub trait ReactiveClient: Send + Sync {
    async fn request(
        &self,
        descriptor: &QueryDescriptor,
        mode: QueryMode,
    ) -> Result<ReactiveResult, ReactiveError>;

    async fn fetch_snapshot(&self, descriptor: &QueryDescriptor) -> Result<Snapshot, ReactiveError> {
        match self.request(descriptor, QueryMode::Snapshot).await? {
            ReactiveResult::Snapshot(snapshot) => Ok(snapshot),
            ReactiveResult::StreamHandle(_) => Err(ReactiveError::Decode(
                "snapshot request produced a stream handle".to_string(),
            )),
        }
    }

    async fn open_stream(&self, descriptor: &QueryDescriptor) -> Result<StreamHandle, ReactiveError> {
        match self.request(descriptor, QueryMode::Stream).await? {
            ReactiveResult::StreamHandle(handle) => Ok(handle),
            ReactiveResult::Snapshot(_) => Err(ReactiveError::Decode(
                "stream request produced a snapshot".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: Value, value: Value) -> SnapshotRow {
        SnapshotRow {
            id,
            value: value.as_object().cloned().unwrap(),
        }
    }

    #[test]
    fn into_values_keeps_order_and_existing_ids() {
        let snap = Snapshot {
            rows: vec![
                row(json!(2), json!({"id": 2, "title": "b", "upvotes": 3})),
                row(json!(1), json!({"id": 1, "title": "a", "upvotes": 1})),
            ],
        };
        let values = snap.into_values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0]["id"], 2);
        assert_eq!(values[1]["title"], "a");
    }

    #[test]
    fn into_values_fills_missing_id_from_row_key() {
        let snap = Snapshot {
            rows: vec![row(json!(9), json!({"title": "x"}))],
        };
        assert_eq!(snap.into_values()[0], json!({"title": "x", "id": 9}));
    }

    #[test]
    fn into_values_never_overwrites_value_id() {
        let snap = Snapshot {
            rows: vec![row(json!("k1"), json!({"id": 5}))],
        };
        assert_eq!(snap.into_values()[0]["id"], 5);
    }

    #[test]
    fn stream_handle_allows_only_unreserved_ascii() {
        for ok in ["abc123", "6f1c1f3e-8d52", "a.b_c~d"] {
            assert_eq!(StreamHandle::parse(ok).unwrap().as_str(), ok);
        }
        for bad in ["tok\u{e9}", "tok%2F", "a+b", "a/b", "a b", "a?b", "a#b", "a\u{7f}"] {
            assert!(
                matches!(StreamHandle::parse(bad), Err(ReactiveError::Decode(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn mode_endpoints() {
        assert_eq!(QueryMode::Snapshot.endpoint(), "snapshot");
        assert_eq!(QueryMode::Stream.endpoint(), "streams");
    }

    struct AlwaysHandle;

    #[async_trait]
    impl ReactiveClient for AlwaysHandle {
        async fn request(
            &self,
            _descriptor: &QueryDescriptor,
            _mode: QueryMode,
        ) -> Result<ReactiveResult, ReactiveError> {
            Ok(ReactiveResult::StreamHandle(StreamHandle("abc".to_string())))
        }
    }

    #[tokio::test]
    async fn fetch_snapshot_rejects_mismatched_variant() {
        let d = QueryDescriptor::posts(10).unwrap();
        let err = AlwaysHandle.fetch_snapshot(&d).await.unwrap_err();
        assert!(matches!(err, ReactiveError::Decode(_)));
        assert_eq!(AlwaysHandle.open_stream(&d).await.unwrap().as_str(), "abc");
    }
}
