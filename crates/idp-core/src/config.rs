//! Configuration for the identity provider protocol core.
//!
//! All values have defaults; the server binary overrides them from the
//! environment (see `idp-server`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Login surface configuration.
    pub login: LoginConfig,
    /// Token lifetimes.
    pub tokens: TokenConfig,
    /// Signing key configuration.
    pub keys: KeyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Public base URL; tenant issuers are `{base_url}/{tenant_id}`.
    pub base_url: String,
}

/// Login surface configuration.
///
/// The login UI itself is an external collaborator; the protocol core only
/// redirects to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Absolute URL of the login surface.
    pub login_url: String,
}

/// Token and ephemeral record lifetimes, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Default TTL for service-account and anonymous-user tokens, and for
    /// end-user tokens when the client has no TTL configured.
    pub default_token_ttl_seconds: i64,
    /// Lifetime of a pre-authentication state record.
    pub pre_auth_ttl_seconds: i64,
    /// Lifetime of an unredeemed authorization code.
    pub authorization_code_ttl_seconds: i64,
    /// Refresh grant lifetime when the client has none configured.
    pub default_refresh_token_ttl_seconds: i64,
}

/// Signing key configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfig {
    /// Identifier of the root tenant that owns the JWT signing keys.
    pub root_tenant_id: String,
    /// How long the signing key cache is reused before reloading.
    pub cache_ttl_seconds: u64,
    /// How long past `expires_at` a key stays published in the JWKS.
    pub jwks_grace_period_seconds: i64,
}

impl Config {
    /// Returns the issuer URL for a tenant.
    #[must_use]
    pub fn issuer(&self, tenant_id: &str) -> String {
        format!("{}/{tenant_id}", self.server.base_url.trim_end_matches('/'))
    }

    /// Returns the token endpoint URL for a tenant.
    ///
    /// Client assertions must carry exactly this value as `aud`.
    #[must_use]
    pub fn token_endpoint(&self, tenant_id: &str) -> String {
        format!("{}/oidc/token", self.issuer(tenant_id))
    }

    /// Returns the signing key cache TTL.
    #[must_use]
    pub const fn key_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.keys.cache_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                base_url: "http://localhost:8080".to_string(),
            },
            login: LoginConfig {
                login_url: "http://localhost:3000/login".to_string(),
            },
            tokens: TokenConfig {
                default_token_ttl_seconds: 3_600,
                pre_auth_ttl_seconds: 300,
                authorization_code_ttl_seconds: 600,
                default_refresh_token_ttl_seconds: 2_592_000,
            },
            keys: KeyConfig {
                root_tenant_id: "root".to_string(),
                cache_ttl_seconds: 12 * 60 * 60,
                jwks_grace_period_seconds: 30 * 24 * 60 * 60,
            },
        }
    }
}
