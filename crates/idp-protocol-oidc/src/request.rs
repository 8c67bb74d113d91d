//! OIDC request types.
//!
//! Request types for OAuth 2.0 and `OpenID` Connect endpoints. Every field
//! is optional at the parsing layer so that missing parameters are reported
//! by the validators with protocol error codes rather than as extractor
//! rejections.

use serde::{Deserialize, Serialize};

use crate::types::GrantType;

/// Authorization endpoint request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// Client ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Redirect URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Scope (space-separated).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// State parameter (recommended for CSRF protection).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Response type; only `code` is supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,

    /// Response mode; `fragment` or anything else for query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mode: Option<String>,

    // === PKCE Parameters ===
    /// PKCE code challenge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,

    /// PKCE code challenge method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

impl AuthorizationRequest {
    /// Creates a `response_type=code` request.
    #[must_use]
    pub fn code(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            redirect_uri: Some(redirect_uri.into()),
            scope: Some(scope.into()),
            response_type: Some("code".to_string()),
            ..Self::default()
        }
    }

    /// Sets the PKCE parameters.
    #[must_use]
    pub fn with_pkce(mut self, challenge: Option<&str>, method: Option<&str>) -> Self {
        self.code_challenge = challenge.map(ToString::to_string);
        self.code_challenge_method = method.map(ToString::to_string);
        self
    }

    /// Sets the state parameter.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Returns the PKCE challenge, treating an empty value as absent.
    #[must_use]
    pub fn code_challenge(&self) -> Option<&str> {
        non_empty(self.code_challenge.as_deref())
    }

    /// Returns the PKCE method, treating an empty value as absent.
    #[must_use]
    pub fn code_challenge_method(&self) -> Option<&str> {
        non_empty(self.code_challenge_method.as_deref())
    }

    /// Returns the scope, treating a blank value as absent.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Token endpoint request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRequest {
    /// Grant type.
    #[serde(default)]
    pub grant_type: String,

    /// Authorization code (for `authorization_code` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Redirect URI (for `authorization_code` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,

    /// Client ID (`client_secret_post` or assertion subject).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret (`client_secret_post`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Client assertion JWT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_assertion: Option<String>,

    /// Client assertion type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_assertion_type: Option<String>,

    /// Scope (for `client_credentials` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Refresh token (for `refresh_token` grant).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// PKCE code verifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
}

impl TokenRequest {
    /// Parses the grant type.
    ///
    /// # Errors
    ///
    /// Returns an error if the grant type is unknown.
    pub fn parsed_grant_type(&self) -> Result<GrantType, String> {
        self.grant_type.parse()
    }
}

/// Revocation endpoint request (RFC 7009).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevocationRequest {
    /// The refresh token to revoke.
    #[serde(default)]
    pub token: String,

    /// Token type hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type_hint: Option<String>,

    /// Client ID (`client_secret_post` or assertion subject).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret (`client_secret_post`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Client assertion JWT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_assertion: Option<String>,

    /// Client assertion type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_assertion_type: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
