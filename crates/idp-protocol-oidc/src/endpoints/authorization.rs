//! Authorization endpoint handler.
//!
//! Implements GET `/oidc/authorize` for the authorization code flow. Every
//! outcome is a `302 Found` to the login surface: either carrying the
//! pre-authentication handle, or carrying the error and the echoed
//! non-sensitive request parameters.

use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::request::AuthorizationRequest;

use super::error_response;
use super::state::OidcState;

/// GET `/oidc/authorize`
///
/// # Responses
///
/// - 302 Found: Redirect to the login surface
/// - 500 Internal Server Error: Store unavailable or login URL misconfigured
pub async fn authorize(
    State(state): State<OidcState>,
    Path(tenant_id): Path<String>,
    Query(request): Query<AuthorizationRequest>,
) -> Response {
    match state.validator.validate(&tenant_id, &request).await {
        Ok(outcome) => found(outcome.location()),
        Err(ref err) => error_response(err),
    }
}

/// Builds a `302 Found` response.
fn found(location: &Url) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, location.as_str()),
            (header::CACHE_CONTROL, "no-store"),
        ],
    )
        .into_response()
}
