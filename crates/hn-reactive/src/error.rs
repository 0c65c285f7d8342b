use thiserror::Error;

/// Failures talking to the reactive backend.
///
/// Every variant reflects an external failure; the client never retries and
/// never substitutes a default result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// Transport failure or timeout before a response arrived.
    #[error("reactive backend unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with a non-success status.
    #[error("reactive backend returned status {status}: {body}")]
    Backend { status: u16, body: String },

    /// Response did not match the documented envelope.
    #[error("reactive response decode failed: {0}")]
    Decode(String),
}

impl ReactiveError {
    /// Backend status carried by the error, if any.
    pub fn backend_status(&self) -> Option<u16> {
        match self {
            ReactiveError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReactiveError::Unavailable(_) => "backend_unavailable",
            ReactiveError::Backend { .. } => "backend_error",
            ReactiveError::Decode(_) => "decode_error",
        }
    }
}
