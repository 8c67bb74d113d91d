//! Token endpoint handler.
//!
//! Implements POST `/oidc/token` for the supported grant types:
//! - `authorization_code`
//! - `refresh_token`
//! - `client_credentials`

use axum::{
    Form, Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::client_auth::extract_client_credentials;
use crate::error::OidcResult;
use crate::request::TokenRequest;
use crate::token::TokenResponse;

use super::state::OidcState;
use super::{authorization_header, error_response};

/// POST `/oidc/token`
///
/// Authenticates the client, then dispatches on `grant_type`.
///
/// # Responses
///
/// - 200 OK: Token response JSON
/// - 400 Bad Request: Invalid request, grant, or scope; client not authorized
/// - 401 Unauthorized: No client credentials
/// - 500 Internal Server Error: Server error
pub async fn token(
    State(state): State<OidcState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Response {
    match handle_token_request(&state, &tenant_id, &headers, &request).await {
        Ok(response) => token_response(response),
        Err(ref err) => error_response(err),
    }
}

async fn handle_token_request(
    state: &OidcState,
    tenant_id: &str,
    headers: &HeaderMap,
    request: &TokenRequest,
) -> OidcResult<TokenResponse> {
    let credentials = extract_client_credentials(
        authorization_header(headers),
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
        request.client_assertion.as_deref(),
        request.client_assertion_type.as_deref(),
    )?;
    let client = state.authenticator.authenticate(tenant_id, &credentials).await?;
    state.grants.handle(tenant_id, &client, request).await
}

/// Serializes a token response with the caching headers RFC 6749 requires.
pub(super) fn token_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(response),
    )
        .into_response()
}
