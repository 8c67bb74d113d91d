//! JWT claim types for OIDC tokens.
//!
//! Implements token claims as defined in:
//! - RFC 7519 (JSON Web Token)
//! - RFC 7523 (JWT client assertions)
//! - `OpenID` Connect Core 1.0

use chrono::{DateTime, Utc};
use idp_model::{Address, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::TokenType;

/// Claims shared by access and ID tokens.
///
/// End-user, service-account, and anonymous-user tokens all use this shape;
/// personal claims are simply absent for the latter two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    // === Standard JWT Claims (RFC 7519) ===
    /// Issuer - tenant-scoped issuer URL.
    pub iss: String,

    /// Subject - user id, client id, or anonymous id.
    pub sub: String,

    /// Audience - the client the token was issued to.
    pub aud: Audience,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// Issued at time (Unix timestamp).
    pub iat: i64,

    /// JWT ID - unique identifier for the token.
    pub jti: String,

    // === OIDC Standard Claims ===
    /// Full name, rendered in the user's name order.
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

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Email verified flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,

    /// Phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,

    /// Phone number verified flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number_verified: Option<bool>,

    /// Postal address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,

    /// Locale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Scope - space-separated list of scopes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    // === Custom Claims ===
    /// Tenant the token belongs to.
    pub tenant_id: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Kind of principal.
    pub token_type: TokenType,
}

impl TokenClaims {
    /// Creates claims with no personal data.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        let client_id = client_id.into();
        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: Audience::Single(client_id.clone()),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            name: None,
            given_name: None,
            middle_name: None,
            family_name: None,
            email: None,
            email_verified: None,
            phone_number: None,
            phone_number_verified: None,
            address: None,
            locale: None,
            scope: None,
            tenant_id: tenant_id.into(),
            client_id,
            token_type,
        }
    }

    /// Copies profile claims from a user.
    #[must_use]
    pub fn with_user(mut self, user: &User) -> Self {
        self.name = user.full_name();
        self.given_name.clone_from(&user.first_name);
        self.middle_name.clone_from(&user.middle_name);
        self.family_name.clone_from(&user.last_name);
        if let Some(email) = &user.email {
            self.email = Some(email.clone());
            self.email_verified = Some(user.email_verified);
        }
        if let Some(phone) = &user.phone_number {
            self.phone_number = Some(phone.clone());
            self.phone_number_verified = Some(user.phone_number_verified);
        }
        self.address.clone_from(&user.address);
        self.locale.clone_from(&user.locale);
        self
    }

    /// Sets the scope.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        self.scope = (!scope.is_empty()).then_some(scope);
        self
    }

    /// Returns whether the scope claim contains a scope token.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope
            .as_deref()
            .is_some_and(|s| s.split_whitespace().any(|token| token == scope))
    }

    /// Returns whether the token has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

/// Claims of a client assertion JWT.
///
/// Decoded before the signature is verified, so every field is treated as
/// untrusted until the authenticator has finished.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientAssertionClaims {
    /// Issuer; must equal `sub`.
    #[serde(default)]
    pub iss: Option<String>,

    /// Subject; must equal the client id.
    #[serde(default)]
    pub sub: Option<String>,

    /// Audience; must be the tenant's token endpoint.
    #[serde(default)]
    pub aud: Option<Audience>,

    /// Expiration time (Unix timestamp).
    #[serde(default)]
    pub exp: Option<i64>,

    /// JWT ID, recorded for replay protection.
    #[serde(default)]
    pub jti: Option<String>,
}

/// JWT audience claim (can be single string or array).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Audience {
    /// Single audience.
    Single(String),
    /// Multiple audiences.
    Multiple(Vec<String>),
}

impl Audience {
    /// Checks if the audience contains a specific value.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multiple(v) => v.iter().any(|s| s == value),
        }
    }

    /// Checks that the audience is exactly one value equal to `value`.
    #[must_use]
    pub fn is_exactly(&self, value: &str) -> bool {
        match self {
            Self::Single(s) => s == value,
            Self::Multiple(v) => matches!(v.as_slice(), [only] if only == value),
        }
    }
}

impl From<String> for Audience {
    fn from(s: String) -> Self {
        Self::Single(s)
    }
}

impl From<&str> for Audience {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}
