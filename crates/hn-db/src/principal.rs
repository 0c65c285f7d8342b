//! Acting identity for mutations.
//!
//! There is no authentication layer. The identity that authors posts and casts
//! upvotes comes from a [`PrincipalSource`]; the daemon wires in
//! [`ConfiguredPrincipal`], and a real identity source can replace it without
//! touching the gateway.

use hn_config::PrincipalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    pub user_id: i32,
}

pub trait PrincipalSource: Send + Sync {
    fn current(&self) -> Principal;
}

/// Fixed principal taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ConfiguredPrincipal(Principal);

impl ConfiguredPrincipal {
    pub fn new(user_id: i32) -> Self {
        Self(Principal { user_id })
    }

    pub fn from_config(cfg: &PrincipalConfig) -> Self {
        Self::new(cfg.user_id)
    }
}

impl PrincipalSource for ConfiguredPrincipal {
    fn current(&self) -> Principal {
        self.0
    }
}
