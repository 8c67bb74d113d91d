//! `UserInfo` endpoint handler.
//!
//! Implements GET/POST `/oidc/userinfo`. The principal is read from the
//! verified Bearer token; no store lookup is made.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use idp_model::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::claims::TokenClaims;
use crate::types::TokenType;

use super::state::OidcState;
use super::{bearer_token, error_response};

/// `UserInfo` response: the principal carried by the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoResponse {
    /// Subject identifier.
    pub sub: String,

    // === Profile scope claims ===
    /// Full name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Middle name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,

    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    // === Email scope claims ===
    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether email is verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    // === Phone scope claims ===
    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Whether phone number is verified.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number_verified: Option<bool>,

    // === Address scope claims ===
    /// Address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    // === Custom claims ===
    /// Tenant.
    pub tenant_id: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Kind of principal.
    pub token_type: TokenType,
}

impl From<TokenClaims> for UserInfoResponse {
    fn from(claims: TokenClaims) -> Self {
        Self {
            sub: claims.sub,
            name: claims.name,
            given_name: claims.given_name,
            middle_name: claims.middle_name,
            family_name: claims.family_name,
            locale: claims.locale,
            email: claims.email,
            email_verified: claims.email_verified,
            phone_number: claims.phone_number,
            phone_number_verified: claims.phone_number_verified,
            address: claims.address,
            tenant_id: claims.tenant_id,
            client_id: claims.client_id,
            token_type: claims.token_type,
        }
    }
}

/// Error body returned by the `UserInfo` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoError {
    /// OAuth error code.
    pub error: String,
    /// Stable machine-readable code.
    pub error_code: String,
    /// Human-readable description.
    pub error_description: String,
    /// Documentation link.
    pub error_uri: Option<String>,
    /// When the error occurred.
    pub timestamp: DateTime<Utc>,
    /// Correlation id for logs.
    pub trace_id: String,
}

/// GET/POST `/oidc/userinfo`
///
/// # Authorization
///
/// Requires `Authorization: Bearer <access_token>`.
///
/// # Responses
///
/// - 200 OK: `UserInfo` JSON
/// - 400 Bad Request: Missing header, or a token that does not verify
/// - 500 Internal Server Error: Keys could not be loaded
pub async fn userinfo(
    State(state): State<OidcState>,
    Path(tenant_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return userinfo_error(
            &state,
            "invalid_request",
            "ERROR_MISSING_AUTHORIZATION_HEADER",
            "Bearer token required in Authorization header",
        );
    };

    match state.verifier.verify(&tenant_id, token).await {
        Ok(claims) => (StatusCode::OK, Json(UserInfoResponse::from(claims))).into_response(),
        Err(ref err) if err.is_server_error() => error_response(err),
        Err(_) => userinfo_error(
            &state,
            "invalid_token",
            "ERROR_INVALID_TOKEN",
            "The access token is invalid or expired",
        ),
    }
}

fn userinfo_error(state: &OidcState, error: &str, code: &str, description: &str) -> Response {
    let body = UserInfoError {
        error: error.to_string(),
        error_code: code.to_string(),
        error_description: description.to_string(),
        error_uri: None,
        timestamp: state.clock.now(),
        trace_id: Uuid::new_v4().to_string(),
    };
    debug!(error_code = code, trace_id = %body.trace_id, "userinfo request rejected");
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}
