//! Client domain model.
//!
//! Clients are the relying-party applications that request authentication
//! from a tenant. A client's tenant and secret are fixed at creation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of client application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    /// Machine client; authenticates as itself, never on behalf of a user.
    ServiceAccount,
    /// Device client with delegated user permissions.
    Device,
    /// Application acting with user-delegated permissions.
    UserDelegated,
    /// Regular interactive application.
    #[default]
    Standard,
}

/// A relying-party client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Client {
    /// OAuth `client_id`.
    pub client_id: String,
    /// Shared secret. Generated once; never changed by updates.
    pub client_secret: String,
    /// Kind of client.
    pub client_type: ClientType,
    /// Owning tenant. Immutable.
    pub tenant_id: String,
    /// Display name.
    pub client_name: Option<String>,
    /// Whether the client is enabled.
    pub enabled: bool,
    /// Whether the client may use the OIDC authorization flow.
    pub oidc_enabled: bool,
    /// Whether the client may send PKCE parameters.
    pub pkce_enabled: bool,
    /// Registered redirect URIs.
    pub redirect_uris: HashSet<String>,
    /// How many times a refresh grant may be redeemed. Zero disables refresh tokens.
    pub max_refresh_token_count: u32,
    /// End-user token TTL in seconds.
    pub end_user_token_ttl_seconds: Option<i64>,
    /// Refresh grant TTL in seconds.
    pub refresh_token_ttl_seconds: Option<i64>,
    /// When the client was created.
    pub created_at: DateTime<Utc>,
    /// When the client was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Mutable client settings.
///
/// Fields left as `None` keep their current value. There is deliberately no
/// way to change the tenant or the secret.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientUpdate {
    /// New display name.
    pub client_name: Option<String>,
    /// New enabled flag.
    pub enabled: Option<bool>,
    /// New OIDC flag.
    pub oidc_enabled: Option<bool>,
    /// New PKCE flag.
    pub pkce_enabled: Option<bool>,
    /// Replacement redirect URI set.
    pub redirect_uris: Option<HashSet<String>>,
    /// New refresh redemption limit.
    pub max_refresh_token_count: Option<u32>,
    /// New end-user token TTL.
    pub end_user_token_ttl_seconds: Option<i64>,
    /// New refresh grant TTL.
    pub refresh_token_ttl_seconds: Option<i64>,
}

impl Client {
    /// Creates a client with a fresh UUID identifier and a random secret.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>, client_type: ClientType) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), tenant_id, client_type)
    }

    /// Creates a client with a caller-chosen identifier and a random secret.
    #[must_use]
    pub fn with_id(
        client_id: impl Into<String>,
        tenant_id: impl Into<String>,
        client_type: ClientType,
    ) -> Self {
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        let now = Utc::now();
        Self {
            client_id: client_id.into(),
            client_secret: hex::encode(secret),
            client_type,
            tenant_id: tenant_id.into(),
            client_name: None,
            enabled: true,
            oidc_enabled: true,
            pkce_enabled: false,
            redirect_uris: HashSet::new(),
            max_refresh_token_count: 0,
            end_user_token_ttl_seconds: None,
            refresh_token_ttl_seconds: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Adds a redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uris.insert(uri.into());
        self
    }

    /// Enables PKCE.
    #[must_use]
    pub const fn with_pkce(mut self) -> Self {
        self.pkce_enabled = true;
        self
    }

    /// Sets the OIDC flag.
    #[must_use]
    pub const fn with_oidc_enabled(mut self, enabled: bool) -> Self {
        self.oidc_enabled = enabled;
        self
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enables refresh tokens with the given redemption limit.
    #[must_use]
    pub const fn with_max_refresh_token_count(mut self, count: u32) -> Self {
        self.max_refresh_token_count = count;
        self
    }

    /// Sets the end-user token TTL.
    #[must_use]
    pub const fn with_end_user_token_ttl(mut self, seconds: i64) -> Self {
        self.end_user_token_ttl_seconds = Some(seconds);
        self
    }

    /// Returns whether this client is a service account.
    #[must_use]
    pub const fn is_service_account(&self) -> bool {
        matches!(self.client_type, ClientType::ServiceAccount)
    }

    /// Returns whether refresh tokens are issued to this client.
    #[must_use]
    pub const fn refresh_enabled(&self) -> bool {
        self.max_refresh_token_count > 0
    }

    /// Returns whether the client's own scopes extend the requestable set.
    #[must_use]
    pub const fn uses_delegated_scopes(&self) -> bool {
        matches!(
            self.client_type,
            ClientType::Device | ClientType::UserDelegated
        ) && self.refresh_enabled()
    }

    /// Applies an update, leaving the tenant and secret untouched.
    pub fn apply_update(&mut self, update: ClientUpdate) {
        if let Some(name) = update.client_name {
            self.client_name = Some(name);
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(oidc_enabled) = update.oidc_enabled {
            self.oidc_enabled = oidc_enabled;
        }
        if let Some(pkce_enabled) = update.pkce_enabled {
            self.pkce_enabled = pkce_enabled;
        }
        if let Some(redirect_uris) = update.redirect_uris {
            self.redirect_uris = redirect_uris;
        }
        if let Some(count) = update.max_refresh_token_count {
            self.max_refresh_token_count = count;
        }
        if let Some(ttl) = update.end_user_token_ttl_seconds {
            self.end_user_token_ttl_seconds = Some(ttl);
        }
        if let Some(ttl) = update.refresh_token_ttl_seconds {
            self.refresh_token_ttl_seconds = Some(ttl);
        }
        self.updated_at = Utc::now();
    }
}
