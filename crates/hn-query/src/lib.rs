//! hn-query
//!
//! Query descriptors: the `(name, parameter)` pair that identifies one derived
//! view on the reactive backend.
//!
//! A descriptor is the only thing the facade sends to the backend. The same
//! value is used for snapshot reads and stream subscriptions, and the backend
//! keys its caches and subscriptions on it, so construction validates the
//! parameter up front and the serialized form never changes shape.
//!
//! Adding a named query means adding a [`QueryName`] variant and a
//! [`QueryParam`] variant with its validation here. Nothing in the reactive
//! client changes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Limit used by `GET /posts` when the caller does not pass one.
pub const DEFAULT_POSTS_LIMIT: u32 = 10;

/// Upper bound on the posts limit when no explicit ceiling is configured.
pub const MAX_POSTS_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid parameter for query '{query}': {reason}")]
    InvalidParameter { query: &'static str, reason: String },

    #[error("unknown query '{0}'")]
    UnknownQuery(String),
}

impl QueryError {
    pub fn invalid(query: QueryName, reason: impl Into<String>) -> Self {
        QueryError::InvalidParameter {
            query: query.as_str(),
            reason: reason.into(),
        }
    }
}

/// Named views served by the reactive backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryName {
    /// Posts with author name and upvote count, ordered by upvotes descending.
    Posts,
}

impl QueryName {
    /// Path segment used on the backend (`/snapshot/<name>`, `/streams/<name>`).
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryName::Posts => "posts",
        }
    }

    pub fn parse(s: &str) -> Result<Self, QueryError> {
        match s.trim() {
            "posts" => Ok(QueryName::Posts),
            other => Err(QueryError::UnknownQuery(other.to_string())),
        }
    }
}

impl fmt::Display for QueryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter of a named query. Serializes untagged: `Limit(10)` is the JSON
/// number `10`, which is exactly the request body the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    Limit(u32),
}

/// Immutable `(name, parameter)` pair. Fields are private so every value in
/// circulation went through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct QueryDescriptor {
    name: QueryName,
    param: QueryParam,
}

impl QueryDescriptor {
    /// `posts` limited to `limit` rows, bounded by [`MAX_POSTS_LIMIT`].
    pub fn posts(limit: i64) -> Result<Self, QueryError> {
        Self::posts_bounded(limit, MAX_POSTS_LIMIT)
    }

    /// `posts` limited to `limit` rows, with an explicit ceiling.
    pub fn posts_bounded(limit: i64, max_limit: u32) -> Result<Self, QueryError> {
        if limit <= 0 {
            return Err(QueryError::invalid(
                QueryName::Posts,
                format!("limit must be positive, got {limit}"),
            ));
        }
        if limit > i64::from(max_limit) {
            return Err(QueryError::invalid(
                QueryName::Posts,
                format!("limit must be at most {max_limit}, got {limit}"),
            ));
        }
        Ok(Self {
            name: QueryName::Posts,
            param: QueryParam::Limit(limit as u32),
        })
    }

    /// Parse a raw limit as it arrives in a query string.
    pub fn posts_from_raw(raw: &str, max_limit: u32) -> Result<Self, QueryError> {
        let limit: i64 = raw.trim().parse().map_err(|_| {
            QueryError::invalid(QueryName::Posts, format!("limit is not an integer: '{raw}'"))
        })?;
        Self::posts_bounded(limit, max_limit)
    }

    pub fn name(&self) -> QueryName {
        self.name
    }

    pub fn param(&self) -> &QueryParam {
        &self.param
    }

    /// The request body sent to the backend: the bare parameter.
    pub fn body_json(&self) -> serde_json::Value {
        match self.param {
            QueryParam::Limit(n) => serde_json::Value::from(n),
        }
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.param {
            QueryParam::Limit(n) => write!(f, "{}(limit={})", self.name, n),
        }
    }
}
