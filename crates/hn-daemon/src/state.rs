//! Shared runtime state for hn-daemon.
//!
//! Handlers receive `State<Arc<AppState>>`. Everything here is a shared,
//! read-only handle: the reactive client, the mutation gateway, the principal
//! source and a few config values. No request data is kept between calls.

use std::sync::Arc;

use hn_config::FacadeConfig;
use hn_db::{MutationGateway, PrincipalSource};
use hn_reactive::ReactiveClient;

/// Static build metadata.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Clone)]
pub struct AppState {
    pub reactive: Arc<dyn ReactiveClient>,
    pub gateway: Arc<dyn MutationGateway>,
    pub principal: Arc<dyn PrincipalSource>,
    pub default_limit: u32,
    pub max_limit: u32,
    /// Path prefix of stream redirects, without trailing slash.
    pub redirect_prefix: String,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(
        reactive: Arc<dyn ReactiveClient>,
        gateway: Arc<dyn MutationGateway>,
        principal: Arc<dyn PrincipalSource>,
        cfg: &FacadeConfig,
    ) -> Self {
        Self {
            reactive,
            gateway,
            principal,
            default_limit: cfg.posts.default_limit,
            max_limit: cfg.posts.max_limit,
            redirect_prefix: cfg.streams.redirect_prefix.trim_end_matches('/').to_string(),
            build: BuildInfo {
                service: "hn-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
        }
    }

    /// Redirect target for a stream handle.
    pub fn stream_location(&self, handle: &str) -> String {
        format!("{}/{}", self.redirect_prefix, handle)
    }
}
