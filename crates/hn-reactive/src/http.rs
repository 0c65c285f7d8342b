//! reqwest-backed [`ReactiveClient`].

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hn_query::QueryDescriptor;
use tracing::{debug, error};

use crate::{
    decode_snapshot, decode_stream_handle, QueryMode, ReactiveClient, ReactiveError,
    ReactiveResult,
};

/// Longest backend error body carried into a [`ReactiveError::Backend`].
const MAX_ERROR_BODY: usize = 512;

/// Shared, cloneable client for one reactive backend base URL.
///
/// The inner `reqwest::Client` pools connections and is safe to share across
/// concurrent requests without further locking.
#[derive(Debug, Clone)]
pub struct HttpReactiveClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpReactiveClient {
    /// Every request (connect + response) is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("failed to build reactive http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, descriptor: &QueryDescriptor, mode: QueryMode) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            mode.endpoint(),
            descriptor.name().as_str()
        )
    }
}

#[async_trait]
impl ReactiveClient for HttpReactiveClient {
    async fn request(
        &self,
        descriptor: &QueryDescriptor,
        mode: QueryMode,
    ) -> Result<ReactiveResult, ReactiveError> {
        let url = self.endpoint_url(descriptor, mode);
        debug!(query = %descriptor, mode = mode.as_str(), %url, "reactive request");

        let resp = self
            .http
            .post(&url)
            .json(descriptor.param())
            .send()
            .await
            .map_err(|e| ReactiveError::Unavailable(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ReactiveError::Unavailable(e.to_string()))?;

        if !status.is_success() {
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                text.truncate(cut);
            }
            return Err(ReactiveError::Backend {
                status: status.as_u16(),
                body: text,
            });
        }

        let decoded = match mode {
            QueryMode::Snapshot => decode_snapshot(&body).map(ReactiveResult::Snapshot),
            QueryMode::Stream => decode_stream_handle(&body).map(ReactiveResult::StreamHandle),
        };

        if let Err(e) = &decoded {
            error!(query = %descriptor, mode = mode.as_str(), error = %e, "reactive envelope violated");
        }
        decoded
    }
}
