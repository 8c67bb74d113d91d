//! Anonymous-user token endpoint handler.
//!
//! Implements POST `/oidc/anonymous-token`. A service-account client with the
//! `anonymous_user.create` scope exchanges its own token for a token
//! representing a fresh anonymous user of another client.

use axum::{
    Form,
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::error::OidcError;

use super::state::OidcState;
use super::token::token_response;
use super::{bearer_token, error_response};

/// Anonymous-token request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnonymousTokenRequest {
    /// Client the anonymous user's token is issued to.
    #[serde(default)]
    pub client_id: String,
}

/// POST `/oidc/anonymous-token`
///
/// # Authorization
///
/// Requires `Authorization: Bearer <service_account_token>`.
///
/// # Responses
///
/// - 200 OK: Token response JSON
/// - 400 Bad Request: Missing parameters, or the caller may not create
///   anonymous users in this tenant
/// - 500 Internal Server Error: Server error
pub async fn anonymous_token(
    State(state): State<OidcState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
    Form(request): Form<AnonymousTokenRequest>,
) -> Response {
    let Some(caller) = bearer_token(&headers) else {
        return error_response(&OidcError::InvalidRequest(
            "Bearer token required".to_string(),
        ));
    };
    if request.client_id.is_empty() {
        return error_response(&OidcError::InvalidRequest(
            "client_id is required".to_string(),
        ));
    }

    match state
        .issuer
        .issue_anonymous_user_token(&tenant_id, &request.client_id, caller)
        .await
    {
        Ok(response) => token_response(response),
        Err(ref err) => error_response(err),
    }
}
