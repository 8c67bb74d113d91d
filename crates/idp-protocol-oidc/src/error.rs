//! OIDC protocol error types.
//!
//! Implements OAuth 2.0 and `OpenID` Connect error responses as defined in:
//! - RFC 6749 (OAuth 2.0)
//! - `OpenID` Connect Core 1.0
//!
//! Entity-not-found, disabled, and replay conditions are reported with the
//! same coarse messages so callers cannot tell which check failed.

use idp_crypto::CryptoError;
use idp_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OIDC protocol errors.
#[derive(Debug, Error)]
pub enum OidcError {
    /// Invalid request parameters.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// Client authentication failed.
    #[error("invalid_client: {0}")]
    InvalidClient(String),

    /// Invalid or expired authorization grant.
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// Client is not authorized for this request.
    #[error("unauthorized_client: {0}")]
    UnauthorizedClient(String),

    /// Unsupported grant type.
    #[error("unsupported_grant_type: {0}")]
    UnsupportedGrantType(String),

    /// Invalid scope.
    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    /// Unsupported response type.
    #[error("unsupported_response_type: {0}")]
    UnsupportedResponseType(String),

    /// Access denied.
    #[error("access_denied: {0}")]
    AccessDenied(String),

    /// Invalid token.
    #[error("invalid_token: {0}")]
    InvalidToken(String),

    /// No unexpired, active signing key is available.
    #[error("no usable signing key")]
    NoSigningKey,

    /// Token signing error.
    #[error("token signing failed: {0}")]
    TokenSigning(String),

    /// Storage backend failure.
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Key material could not be loaded.
    #[error("key material failure: {0}")]
    KeyMaterial(#[from] CryptoError),

    /// Server error.
    #[error("server_error: {0}")]
    ServerError(String),
}

impl OidcError {
    /// Returns the OAuth 2.0 error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient(_) => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient(_) => "unauthorized_client",
            Self::UnsupportedGrantType(_) => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::UnsupportedResponseType(_) => "unsupported_response_type",
            Self::AccessDenied(_) => "access_denied",
            Self::InvalidToken(_) => "invalid_token",
            Self::NoSigningKey
            | Self::TokenSigning(_)
            | Self::Storage(_)
            | Self::KeyMaterial(_)
            | Self::ServerError(_) => "server_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidScope(_)
            | Self::UnsupportedGrantType(_)
            | Self::UnsupportedResponseType(_)
            | Self::InvalidGrant(_)
            | Self::UnauthorizedClient(_) => 400,
            Self::InvalidClient(_) | Self::InvalidToken(_) => 401,
            Self::AccessDenied(_) => 403,
            Self::NoSigningKey
            | Self::TokenSigning(_)
            | Self::Storage(_)
            | Self::KeyMaterial(_)
            | Self::ServerError(_) => 500,
        }
    }

    /// Returns whether the failure is on the server side.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.http_status() >= 500
    }

    /// Creates an error response for OAuth 2.0/OIDC.
    ///
    /// Server-side failures get a generic description.
    #[must_use]
    pub fn to_error_response(&self) -> ErrorResponse {
        let description = if self.is_server_error() {
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        ErrorResponse {
            error: self.error_code().to_string(),
            error_description: Some(description),
            error_uri: None,
        }
    }
}

/// OAuth 2.0 error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code.
    pub error: String,

    /// Human-readable error description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// URI with more information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

/// Result type for OIDC operations.
pub type OidcResult<T> = Result<T, OidcError>;
