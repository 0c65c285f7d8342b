//! Runtime secret resolution.
//!
//! Config stores only env var NAMES. Callers resolve secrets once at startup
//! and pass [`ResolvedSecrets`] into constructors. `Debug` redacts values and
//! errors mention the variable NAME, never the value.

use anyhow::{bail, Result};

use crate::FacadeConfig;

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub database_url: String,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("database_url", &"<REDACTED>")
            .finish()
    }
}

/// Resolve from the process environment.
pub fn resolve_secrets(config: &FacadeConfig) -> Result<ResolvedSecrets> {
    resolve_secrets_with(config, |name| std::env::var(name).ok())
}

/// Resolve through `lookup`. A blank value counts as missing.
pub fn resolve_secrets_with<F>(config: &FacadeConfig, lookup: F) -> Result<ResolvedSecrets>
where
    F: Fn(&str) -> Option<String>,
{
    let var = config.db.url_env.trim();
    match lookup(var) {
        Some(v) if !v.trim().is_empty() => Ok(ResolvedSecrets {
            database_url: v.trim().to_string(),
        }),
        _ => bail!("SECRETS_MISSING: required env var '{}' (database url) is not set or empty", var),
    }
}
