//! Request and response types for the hn-daemon HTTP endpoints.
//!
//! Post bodies (`NewPost`, `PostFields`) live in hn-db next to the gateway
//! that consumes them. No business logic lives here.

use serde::{Deserialize, Serialize};

/// Body of every successful mutation and of `/healthcheck`.
pub const OK_BODY: &str = "ok";

/// Body of a failed mutation.
pub const NOT_OK_BODY: &str = "not ok";

/// Query string of `GET /posts`. `limit` stays raw so a malformed value is
/// reported as an invalid parameter instead of an extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostsQuery {
    pub limit: Option<String>,
}

/// JSON error body for failed reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    /// "invalid_parameter" | "unknown_query" | "backend_unavailable" | "backend_error" | "decode_error"
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_status: Option<u16>,
}
