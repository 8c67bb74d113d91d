//! Verification of tokens issued by this provider.

use std::sync::Arc;

use idp_core::{Config, SharedClock};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use tracing::debug;

use crate::claims::TokenClaims;
use crate::error::{OidcError, OidcResult};
use crate::key_cache::SigningKeyCache;

/// Verifies RS256 tokens against the published key set.
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    config: Arc<Config>,
    clock: SharedClock,
    key_cache: Arc<SigningKeyCache>,
}

impl TokenVerifier {
    /// Creates a verifier.
    #[must_use]
    pub const fn new(config: Arc<Config>, clock: SharedClock, key_cache: Arc<SigningKeyCache>) -> Self {
        Self {
            config,
            clock,
            key_cache,
        }
    }

    /// Verifies a token issued for `tenant_id` and returns its claims.
    ///
    /// The key is selected by the `kid` header from the published key set.
    /// Expiry is checked against the injected clock with no leeway.
    ///
    /// # Errors
    ///
    /// Returns [`OidcError::InvalidToken`] if the token is malformed, signed
    /// by an unknown key, has a bad signature, was issued for another
    /// tenant, or has expired. Returns a server error if the key set cannot
    /// be loaded.
    pub async fn verify(&self, tenant_id: &str, token: &str) -> OidcResult<TokenClaims> {
        let header = decode_header(token).map_err(|e| invalid(format!("malformed token: {e}")))?;
        if header.alg != Algorithm::RS256 {
            return Err(invalid(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| invalid("missing kid in token header"))?;

        let jwks = self.key_cache.jwks().await?;
        let jwk = jwks
            .find_key(&kid)
            .ok_or_else(|| invalid(format!("unknown signing key: {kid}")))?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| invalid(format!("unusable signing key {kid}: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_issuer(&[self.config.issuer(tenant_id)]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let claims = decode::<TokenClaims>(token, &key, &validation)
            .map_err(|e| invalid(e.to_string()))?
            .claims;

        if claims.is_expired(self.clock.now()) {
            return Err(invalid("token expired"));
        }
        if claims.tenant_id != tenant_id {
            return Err(invalid("token issued for another tenant"));
        }
        Ok(claims)
    }
}

fn invalid(reason: impl Into<String>) -> OidcError {
    let reason = reason.into();
    debug!(reason = %reason, "token verification failed");
    OidcError::InvalidToken(reason)
}
