//! Ephemeral protocol records.
//!
//! Each record is keyed by a random opaque value and carries an expiry.
//! Expired records must be treated as absent by every read path, whether or
//! not they have been physically purged yet.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A keyed record with an expiry.
pub trait EphemeralRecord: Clone + Send + Sync + 'static {
    /// Record type name, for logs and errors.
    const KIND: &'static str;

    /// Lookup key.
    fn key(&self) -> &str;

    /// Instant after which the record no longer exists.
    fn expires_at(&self) -> DateTime<Utc>;

    /// Returns whether the record has expired at `now`.
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at() <= now
    }
}

/// How the authorization response is returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    /// Parameters in the redirect URI query string.
    #[default]
    Query,
    /// Parameters in the redirect URI fragment.
    Fragment,
}

impl ResponseMode {
    /// Parses a `response_mode` parameter.
    ///
    /// Anything other than exactly `fragment` means query.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("fragment") => Self::Fragment,
            _ => Self::Query,
        }
    }

    /// Returns the parameter value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Fragment => "fragment",
        }
    }
}

/// A validated authorization request, waiting for the user to sign in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreAuthenticationState {
    /// Opaque handle passed to the login surface.
    pub token: String,
    /// Requesting client.
    pub client_id: String,
    /// Tenant of the request.
    pub tenant_id: String,
    /// Validated redirect URI.
    pub redirect_uri: String,
    /// Validated, space-separated scope.
    pub scope: String,
    /// Requested response type; always `code`.
    pub response_type: String,
    /// Response mode.
    pub response_mode: ResponseMode,
    /// PKCE challenge.
    pub code_challenge: Option<String>,
    /// PKCE challenge method; always `S256` when present.
    pub code_challenge_method: Option<String>,
    /// Client `state` parameter.
    pub state: Option<String>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

impl EphemeralRecord for PreAuthenticationState {
    const KIND: &'static str = "PreAuthenticationState";

    fn key(&self) -> &str {
        &self.token
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// An unredeemed authorization code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationState {
    /// The authorization code.
    pub code: String,
    /// Authenticated user.
    pub user_id: String,
    /// Client the code was issued to.
    pub client_id: String,
    /// Tenant of the code.
    pub tenant_id: String,
    /// Redirect URI the code was delivered to.
    pub redirect_uri: String,
    /// Granted scope.
    pub scope: String,
    /// PKCE challenge carried over from the authorization request.
    pub code_challenge: Option<String>,
    /// PKCE challenge method.
    pub code_challenge_method: Option<String>,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

impl EphemeralRecord for AuthorizationState {
    const KIND: &'static str = "AuthorizationState";

    fn key(&self) -> &str {
        &self.code
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// An outstanding refresh grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshData {
    /// Opaque refresh token.
    pub refresh_token: String,
    /// User the grant belongs to.
    pub user_id: String,
    /// Client the grant was issued to.
    pub client_id: String,
    /// Tenant of the grant.
    pub tenant_id: String,
    /// Granted scope.
    pub scope: String,
    /// How many times this grant chain has been redeemed.
    pub refresh_count: u32,
    /// Expiry.
    pub expires_at: DateTime<Utc>,
}

impl EphemeralRecord for RefreshData {
    const KIND: &'static str = "RefreshData";

    fn key(&self) -> &str {
        &self.refresh_token
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// A consumed client assertion `jti`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientAuthHistory {
    /// Assertion `jti`.
    pub jti: String,
    /// Client that presented the assertion.
    pub client_id: String,
    /// Tenant of the request.
    pub tenant_id: String,
    /// The assertion's `exp`, in seconds since the epoch.
    pub expires_at_seconds: i64,
}

impl EphemeralRecord for ClientAuthHistory {
    const KIND: &'static str = "ClientAuthHistory";

    fn key(&self) -> &str {
        &self.jti
    }

    fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.expires_at_seconds, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
