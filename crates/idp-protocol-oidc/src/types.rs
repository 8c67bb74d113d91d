//! Common OIDC types and definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `client_assertion_type` for JWT client assertions (RFC 7523).
pub const CLIENT_ASSERTION_TYPE_JWT: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Scope a service account needs to mint anonymous-user tokens.
pub const ANONYMOUS_USER_CREATE_SCOPE: &str = "anonymous_user.create";

/// The only accepted PKCE challenge method.
pub const PKCE_METHOD_S256: &str = "S256";

/// The only supported response type.
pub const RESPONSE_TYPE_CODE: &str = "code";

/// OAuth 2.0 grant types accepted at the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    /// Authorization code grant (RFC 6749 Section 4.1).
    AuthorizationCode,
    /// Client credentials grant (RFC 6749 Section 4.4).
    ClientCredentials,
    /// Refresh token grant (RFC 6749 Section 6).
    RefreshToken,
}

impl GrantType {
    /// All supported grant types.
    pub const ALL: [Self; 3] = [
        Self::AuthorizationCode,
        Self::ClientCredentials,
        Self::RefreshToken,
    ];
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        };
        write!(f, "{s}")
    }
}

impl FromStr for GrantType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorization_code" => Ok(Self::AuthorizationCode),
            "client_credentials" => Ok(Self::ClientCredentials),
            "refresh_token" => Ok(Self::RefreshToken),
            _ => Err(format!("unknown grant type: {s}")),
        }
    }
}

/// Kind of principal a token represents, carried in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenType {
    /// A signed-in end user.
    EndUser,
    /// A client acting as itself.
    ServiceAccount,
    /// An anonymous user minted on behalf of a service account.
    AnonymousUser,
}

impl TokenType {
    /// Returns the claim value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EndUser => "END_USER",
            Self::ServiceAccount => "SERVICE_ACCOUNT",
            Self::AnonymousUser => "ANONYMOUS_USER",
        }
    }
}
