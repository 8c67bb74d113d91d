//! Server configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use idp_core::Config;

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Server host to bind to.
    pub host: String,

    /// Server port.
    pub port: u16,

    /// Base URL for the server (tenant issuers are `{base_url}/{tenant_id}`).
    pub base_url: String,

    /// Absolute URL of the external login surface.
    pub login_url: String,

    /// Tenant that owns the JWT signing keys.
    pub root_tenant_id: String,

    /// Default token lifespan in seconds.
    pub default_token_ttl: i64,

    /// Signing key cache TTL in seconds.
    pub key_cache_ttl: u64,

    /// Key id (`kid`) of the seeded signing key.
    pub signing_key_id: String,

    /// PEM private key seeded as the initial signing key.
    pub signing_key_file: Option<PathBuf>,

    /// Passphrase for an encrypted PKCS#8 signing key.
    pub signing_key_passphrase: Option<String>,

    /// SPKI public key PEM published for the seeded key.
    pub signing_public_key_file: Option<PathBuf>,

    /// X.509 certificate chain PEM published for the seeded key.
    pub signing_certificate_file: Option<PathBuf>,

    /// Days until the seeded key expires.
    pub signing_key_validity_days: i64,

    /// Interval between purges of expired ephemeral records.
    pub purge_interval_seconds: u64,

    /// Log filter.
    pub log_level: String,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let host = env_or("IDP_HOST", &defaults.host);
        let port = env_parse("IDP_PORT", defaults.port);
        let base_url = std::env::var("IDP_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", public_host(&host), port));

        let default_token_ttl = env_parse("IDP_DEFAULT_TOKEN_TTL", defaults.default_token_ttl);
        if default_token_ttl <= 0 {
            anyhow::bail!("IDP_DEFAULT_TOKEN_TTL must be positive");
        }

        Ok(Self {
            host,
            port,
            base_url,
            login_url: env_or("IDP_LOGIN_URL", &defaults.login_url),
            root_tenant_id: env_or("IDP_ROOT_TENANT_ID", &defaults.root_tenant_id),
            default_token_ttl,
            key_cache_ttl: env_parse("IDP_KEY_CACHE_TTL", defaults.key_cache_ttl),
            signing_key_id: env_or("IDP_SIGNING_KEY_ID", &defaults.signing_key_id),
            signing_key_file: std::env::var("IDP_SIGNING_KEY_FILE").ok().map(PathBuf::from),
            signing_key_passphrase: std::env::var("IDP_SIGNING_KEY_PASSPHRASE").ok(),
            signing_public_key_file: std::env::var("IDP_SIGNING_PUBLIC_KEY_FILE")
                .ok()
                .map(PathBuf::from),
            signing_certificate_file: std::env::var("IDP_SIGNING_CERTIFICATE_FILE")
                .ok()
                .map(PathBuf::from),
            signing_key_validity_days: env_parse(
                "IDP_SIGNING_KEY_VALIDITY_DAYS",
                defaults.signing_key_validity_days,
            ),
            purge_interval_seconds: env_parse(
                "IDP_PURGE_INTERVAL",
                defaults.purge_interval_seconds,
            ),
            log_level: env_or("RUST_LOG", &defaults.log_level),
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port
            log_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Builds the protocol configuration.
    #[must_use]
    pub fn protocol_config(&self) -> Config {
        let mut config = Config::default();
        config.server.host.clone_from(&self.host);
        config.server.port = self.port;
        config.server.base_url.clone_from(&self.base_url);
        config.login.login_url.clone_from(&self.login_url);
        config.tokens.default_token_ttl_seconds = self.default_token_ttl;
        config.keys.root_tenant_id.clone_from(&self.root_tenant_id);
        config.keys.cache_ttl_seconds = self.key_cache_ttl;
        config
    }

    /// Returns the ephemeral purge interval.
    #[must_use]
    pub const fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_seconds)
    }
}

fn public_host(host: &str) -> &str {
    if host == "0.0.0.0" { "localhost" } else { host }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("login_url", &self.login_url)
            .field("root_tenant_id", &self.root_tenant_id)
            .field("default_token_ttl", &self.default_token_ttl)
            .field("key_cache_ttl", &self.key_cache_ttl)
            .field("signing_key_id", &self.signing_key_id)
            .field("signing_key_file", &self.signing_key_file)
            .field("signing_public_key_file", &self.signing_public_key_file)
            .field("signing_certificate_file", &self.signing_certificate_file)
            .field("signing_key_validity_days", &self.signing_key_validity_days)
            .field("purge_interval_seconds", &self.purge_interval_seconds)
            .field("log_level", &self.log_level)
            .finish_non_exhaustive()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = Config::default();
        Self {
            host: core.server.host,
            port: core.server.port,
            base_url: core.server.base_url,
            login_url: core.login.login_url,
            root_tenant_id: core.keys.root_tenant_id,
            default_token_ttl: core.tokens.default_token_ttl_seconds,
            key_cache_ttl: core.keys.cache_ttl_seconds,
            signing_key_id: "primary".to_string(),
            signing_key_file: None,
            signing_key_passphrase: None,
            signing_public_key_file: None,
            signing_certificate_file: None,
            signing_key_validity_days: 90,
            purge_interval_seconds: 60,
            log_level: "info".to_string(),
        }
    }
}
