//! OIDC endpoint handlers for Axum.
//!
//! This module provides HTTP handlers for the tenant-scoped endpoints:
//! - Authorization (`/oidc/authorize`)
//! - Token (`/oidc/token`)
//! - JWKS (`/oidc/jwks`)
//! - `UserInfo` (`/oidc/userinfo`)
//! - Revocation (`/oidc/revoke`)
//! - Anonymous-user tokens (`/oidc/anonymous-token`)
//! - Discovery (`/.well-known/openid-configuration`)
//!
//! ## Router Setup
//!
//! Use [`oidc_router`] to create a configured Axum router with all endpoints.
//!
//! ```rust,ignore
//! use idp_protocol_oidc::endpoints::{OidcState, oidc_router};
//!
//! let state = OidcState::new(config, stores, SystemClock::shared());
//! let app = oidc_router().with_state(state);
//! ```

mod anonymous;
mod authorization;
mod discovery;
mod revocation;
mod router;
mod state;
mod token;
mod userinfo;

use axum::{
    Json,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::OidcError;

pub use router::oidc_router;
pub use state::OidcState;
pub use userinfo::UserInfoResponse;

/// Converts an `OidcError` to an OAuth JSON error response.
fn error_response(err: &OidcError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(error = %err, "request failed");
    }
    (
        status,
        [(header::CACHE_CONTROL, "no-store")],
        Json(err.to_error_response()),
    )
        .into_response()
}

/// Returns the `Authorization` header value, if present and readable.
fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// Returns the Bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    authorization_header(headers)
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
