//! hn-daemon library target.
//!
//! Exposes the router, state and negotiation for integration tests.
//! The binary `main.rs` depends on this library target.

pub mod api_types;
pub mod error;
pub mod negotiation;
pub mod routes;
pub mod state;
