//! HTTP mapping of read-path failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hn_query::QueryError;
use hn_reactive::ReactiveError;
use thiserror::Error;
use tracing::{error, warn};

use crate::api_types::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Reactive(#[from] ReactiveError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Query(_) => StatusCode::BAD_REQUEST,
            ApiError::Reactive(ReactiveError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Reactive(ReactiveError::Backend { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Reactive(ReactiveError::Decode(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Query(QueryError::InvalidParameter { .. }) => "invalid_parameter",
            ApiError::Query(QueryError::UnknownQuery(_)) => "unknown_query",
            ApiError::Reactive(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            // Contract drift on the backend side; never expected in normal operation.
            ApiError::Reactive(ReactiveError::Decode(_)) => {
                error!(error = %self, "unexpected reactive response shape")
            }
            ApiError::Reactive(_) => warn!(error = %self, "reactive read failed"),
            ApiError::Query(_) => {}
        }

        let backend_status = match &self {
            ApiError::Reactive(e) => e.backend_status(),
            ApiError::Query(_) => None,
        };

        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
                kind: self.kind().to_string(),
                backend_status,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_per_failure() {
        let q = ApiError::from(QueryError::UnknownQuery("x".into()));
        assert_eq!(q.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ReactiveError::Unavailable("down".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ReactiveError::Backend {
                status: 500,
                body: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(ReactiveError::Decode("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
