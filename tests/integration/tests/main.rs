//! End-to-end integration tests.
//!
//! These tests drive the full server router with `tower::ServiceExt::oneshot`
//! against in-memory stores and a manual clock.

mod authorize;
mod client_assertion;
mod common;
mod keys;
mod token_flows;
mod userinfo;
