//! JSON Web Key Set (JWKS) types.
//!
//! Implements JWKS as defined in:
//! - [RFC 7517](https://tools.ietf.org/html/rfc7517) (JSON Web Key)
//! - [RFC 7518](https://tools.ietf.org/html/rfc7518) (JSON Web Algorithms)

use chrono::{DateTime, Duration, Utc};
use idp_crypto::keys::{load_rsa_public_key, parse_certificate_chain};
use idp_crypto::{CryptoResult, RsaPublicComponents};
use idp_model::{KeyStatus, KeyUse, SigningKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// JSON Web Key Set.
///
/// A set of JSON Web Keys, returned by the JWKS endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    /// Array of JSON Web Keys.
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    /// Creates a JWKS with the given keys.
    #[must_use]
    pub const fn with_keys(keys: Vec<JsonWebKey>) -> Self {
        Self { keys }
    }

    /// Finds a key by its ID.
    #[must_use]
    pub fn find_key(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|k| k.kid == kid)
    }
}

/// Key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    /// RSA key.
    #[serde(rename = "RSA")]
    Rsa,
}

/// An RSA signature-verification JSON Web Key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    /// Key type.
    pub kty: KeyType,

    /// Public key use; always `sig`.
    #[serde(rename = "use")]
    pub key_use: String,

    /// Algorithm intended for use with the key.
    pub alg: String,

    /// Key ID.
    pub kid: String,

    /// RSA modulus (base64url encoded).
    pub n: String,

    /// RSA exponent (base64url encoded).
    pub e: String,

    /// X.509 certificate chain, leaf first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
}

impl JsonWebKey {
    /// Creates an RS256 signature-verification key.
    #[must_use]
    pub fn rsa_signing(kid: impl Into<String>, components: RsaPublicComponents) -> Self {
        Self {
            kty: KeyType::Rsa,
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            kid: kid.into(),
            n: components.n,
            e: components.e,
            x5c: None,
        }
    }

    /// Attaches a certificate chain.
    #[must_use]
    pub fn with_x5c(mut self, chain: Vec<String>) -> Self {
        self.x5c = Some(chain);
        self
    }

    /// Derives the JWK for a stored signing key.
    ///
    /// Prefers the certificate; falls back to the bare public key. Returns
    /// `Ok(None)` when the key has neither.
    ///
    /// # Errors
    ///
    /// Returns an error if the certificate or public key does not parse.
    pub fn from_signing_key(key: &SigningKey) -> CryptoResult<Option<Self>> {
        if let Some(certificate) = &key.key_certificate {
            let chain = parse_certificate_chain(certificate)?;
            let components = RsaPublicComponents::from_public_key(&chain.public_key);
            return Ok(Some(
                Self::rsa_signing(&key.key_id, components).with_x5c(chain.x5c),
            ));
        }
        if let Some(public_key) = &key.public_key {
            let public_key = load_rsa_public_key(public_key)?;
            let components = RsaPublicComponents::from_public_key(&public_key);
            return Ok(Some(Self::rsa_signing(&key.key_id, components)));
        }
        Ok(None)
    }
}

/// Returns whether a key belongs in the published set at `now`.
///
/// Keys stay published for `grace` past their expiry so that tokens signed
/// shortly before rotation still verify.
#[must_use]
pub fn is_publishable(key: &SigningKey, now: DateTime<Utc>, grace: Duration) -> bool {
    key.key_status == KeyStatus::Active
        && key.key_use == KeyUse::JwtSigning
        && key.expires_at + grace > now
}

/// Builds the published key set from stored keys, preserving their order.
///
/// Keys whose public half cannot be derived are skipped with a warning.
#[must_use]
pub fn build_jwks(keys: &[SigningKey], now: DateTime<Utc>, grace: Duration) -> JsonWebKeySet {
    let keys = keys
        .iter()
        .filter(|key| is_publishable(key, now, grace))
        .filter_map(|key| match JsonWebKey::from_signing_key(key) {
            Ok(Some(jwk)) => Some(jwk),
            Ok(None) => {
                warn!(kid = %key.key_id, "signing key has no public key or certificate");
                None
            }
            Err(e) => {
                warn!(kid = %key.key_id, error = %e, "signing key public half unreadable");
                None
            }
        })
        .collect();
    JsonWebKeySet::with_keys(keys)
}
