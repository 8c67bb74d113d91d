//! Signing key cache.
//!
//! Keeps the root tenant's decrypted signing keys in memory for a fixed TTL
//! so the signing path does not read the key store on every token. Newly
//! created or rotated keys are picked up within one TTL, or immediately after
//! [`SigningKeyCache::invalidate`].
//!
//! Population is single-flight: concurrent misses wait on one load instead
//! of each decrypting the same keys. Decryption runs on the blocking pool.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use idp_core::{AuthEvent, Config, EventType, SharedClock};
use idp_crypto::keys::{load_rsa_private_key, private_key_to_pkcs1_der};
use idp_model::SigningKey;
use idp_storage::SigningKeyProvider;
use jsonwebtoken::EncodingKey;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{OidcError, OidcResult};
use crate::jwks::{JsonWebKeySet, build_jwks};

/// A decrypted signing key ready for use.
#[derive(Clone)]
pub struct CachedSigningKey {
    /// Key id, sent as the JWT `kid` header.
    pub key_id: String,
    /// Expiry of the key.
    pub expires_at: DateTime<Utc>,
    encoding_key: EncodingKey,
}

impl CachedSigningKey {
    /// Returns the `jsonwebtoken` signing key.
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for CachedSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedSigningKey")
            .field("key_id", &self.key_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct CachedKeys {
    loaded_at: DateTime<Utc>,
    signing: Vec<Arc<CachedSigningKey>>,
    jwks: Arc<JsonWebKeySet>,
}

/// Process-wide cache of the root tenant's signing keys.
pub struct SigningKeyCache {
    provider: Arc<dyn SigningKeyProvider>,
    root_tenant_id: String,
    ttl: Duration,
    grace: Duration,
    clock: SharedClock,
    cached: RwLock<Option<Arc<CachedKeys>>>,
    refresh: Mutex<()>,
}

impl fmt::Debug for SigningKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyCache")
            .field("root_tenant_id", &self.root_tenant_id)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SigningKeyCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(provider: Arc<dyn SigningKeyProvider>, config: &Config, clock: SharedClock) -> Self {
        Self {
            provider,
            root_tenant_id: config.keys.root_tenant_id.clone(),
            ttl: Duration::from_std(config.key_cache_ttl()).unwrap_or(Duration::MAX),
            grace: Duration::seconds(config.keys.jwks_grace_period_seconds),
            clock,
            cached: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Returns the newest-expiring usable signing key.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::NoSigningKey`] if no unexpired key is cached, or
    /// a storage or key material error if the cache had to be reloaded and
    /// the load failed.
    pub async fn get_current_signing_key(&self) -> OidcResult<Arc<CachedSigningKey>> {
        let keys = self.current().await?;
        let now = self.clock.now();
        keys.signing
            .iter()
            .find(|key| key.expires_at > now)
            .cloned()
            .ok_or(OidcError::NoSigningKey)
    }

    /// Returns the published key set.
    ///
    /// The same set is returned until the cache is reloaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache had to be reloaded and the load failed.
    pub async fn jwks(&self) -> OidcResult<Arc<JsonWebKeySet>> {
        Ok(Arc::clone(&self.current().await?.jwks))
    }

    /// Drops the cached keys; the next read reloads them.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
        debug!("signing key cache invalidated");
    }

    async fn fresh(&self) -> Option<Arc<CachedKeys>> {
        let now = self.clock.now();
        self.cached
            .read()
            .await
            .as_ref()
            .filter(|keys| now - keys.loaded_at < self.ttl)
            .cloned()
    }

    async fn current(&self) -> OidcResult<Arc<CachedKeys>> {
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        let _guard = self.refresh.lock().await;
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        let loaded = Arc::new(self.load().await.inspect_err(|e| {
            error!(error = %e, "failed to load signing keys");
        })?);
        *self.cached.write().await = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    async fn load(&self) -> OidcResult<CachedKeys> {
        let now = self.clock.now();
        let stored = self.provider.list_for_tenant(&self.root_tenant_id).await?;
        let grace = self.grace;

        let (signing, jwks) = tokio::task::spawn_blocking(move || {
            let jwks = build_jwks(&stored, now, grace);
            let candidates = stored
                .iter()
                .filter(|key| key.is_active_jwt_signing() && key.expires_at > now);
            let signing = materialize(candidates)?;
            Ok::<_, OidcError>((signing, jwks))
        })
        .await
        .map_err(|e| OidcError::ServerError(format!("key loading task failed: {e}")))??;

        info!(
            tenant_id = %self.root_tenant_id,
            signing_keys = signing.len(),
            published_keys = jwks.keys.len(),
            "signing keys loaded"
        );
        AuthEvent::builder(EventType::SigningKeysLoaded)
            .tenant(&self.root_tenant_id)
            .detail("signing_keys", signing.len().to_string())
            .emit();

        Ok(CachedKeys {
            loaded_at: now,
            signing,
            jwks: Arc::new(jwks),
        })
    }
}

/// Decrypts keys and orders them newest-expiring first.
///
/// Keys with equal expiry keep their fetch order.
fn materialize<'a>(
    keys: impl Iterator<Item = &'a SigningKey>,
) -> OidcResult<Vec<Arc<CachedSigningKey>>> {
    let mut signing = keys
        .map(|key| -> OidcResult<Arc<CachedSigningKey>> {
            let private_key = load_rsa_private_key(&key.private_key, key.passphrase.as_deref())?;
            let der = private_key_to_pkcs1_der(&private_key)?;
            Ok(Arc::new(CachedSigningKey {
                key_id: key.key_id.clone(),
                expires_at: key.expires_at,
                encoding_key: EncodingKey::from_rsa_der(&der),
            }))
        })
        .collect::<OidcResult<Vec<_>>>()?;
    signing.sort_by(|a, b| b.expires_at.cmp(&a.expires_at));
    Ok(signing)
}
