//! Token revocation endpoint handler.
//!
//! Implements POST `/oidc/revoke` as defined in RFC 7009, for refresh
//! tokens.

use axum::{
    Form,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use crate::client_auth::extract_client_credentials;
use crate::error::{OidcError, OidcResult};
use crate::request::RevocationRequest;

use super::state::OidcState;
use super::{authorization_header, error_response};

/// POST `/oidc/revoke`
///
/// Revokes the refresh grant behind `token`, together with every other
/// refresh grant of the same user for the same client.
///
/// # Authorization
///
/// Requires client authentication, by any supported method.
///
/// # Responses
///
/// - 200 OK: Token revoked (or was already invalid)
/// - 400 Bad Request: Missing token, failed authentication, or a token
///   issued to another client
///
/// Per RFC 7009, the revocation endpoint returns 200 OK even if the token
/// was already invalid, to prevent token scanning attacks.
pub async fn revoke(
    State(state): State<OidcState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    Form(request): Form<RevocationRequest>,
) -> Response {
    match handle_revocation_request(&state, &tenant_id, &headers, &request).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(ref err) => error_response(err),
    }
}

async fn handle_revocation_request(
    state: &OidcState,
    tenant_id: &str,
    headers: &HeaderMap,
    request: &RevocationRequest,
) -> OidcResult<()> {
    let credentials = extract_client_credentials(
        authorization_header(headers),
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
        request.client_assertion.as_deref(),
        request.client_assertion_type.as_deref(),
    )?;
    let client = state.authenticator.authenticate(tenant_id, &credentials).await?;

    if request.token.is_empty() {
        return Err(OidcError::InvalidRequest("token is required".to_string()));
    }
    state.grants.revoke(tenant_id, &client, &request.token).await
}
