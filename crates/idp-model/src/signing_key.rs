//! Signing key domain model.
//!
//! Keys are created administratively and never mutated afterwards except
//! for the transition to [`KeyStatus::Revoked`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a key is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyUse {
    /// Signs issued JWTs.
    JwtSigning,
    /// Encrypts data at rest.
    Encryption,
}

/// Lifecycle state of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    /// Usable.
    Active,
    /// Withdrawn; never used or published again.
    Revoked,
}

/// A stored private signing key.
#[derive(Clone, Serialize, Deserialize)]
pub struct SigningKey {
    /// Key identifier, published as `kid`.
    pub key_id: String,
    /// Owning tenant; the root tenant for JWT signing keys.
    pub tenant_id: String,
    /// PEM-encoded private key (PKCS#1, PKCS#8, or encrypted PKCS#8).
    pub private_key: String,
    /// Passphrase for an encrypted private key.
    pub passphrase: Option<String>,
    /// PEM-encoded public key.
    pub public_key: Option<String>,
    /// PEM-encoded X.509 certificate chain, leaf first.
    pub key_certificate: Option<String>,
    /// Key use.
    pub key_use: KeyUse,
    /// Key status.
    pub key_status: KeyStatus,
    /// When the key stops being used for signing.
    pub expires_at: DateTime<Utc>,
    /// When the key was created.
    pub created_at: DateTime<Utc>,
}

impl SigningKey {
    /// Creates an active JWT signing key.
    #[must_use]
    pub fn new(
        key_id: impl Into<String>,
        tenant_id: impl Into<String>,
        private_key: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key_id: key_id.into(),
            tenant_id: tenant_id.into(),
            private_key: private_key.into(),
            passphrase: None,
            public_key: None,
            key_certificate: None,
            key_use: KeyUse::JwtSigning,
            key_status: KeyStatus::Active,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Sets the private key passphrase.
    #[must_use]
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(passphrase.into());
        self
    }

    /// Sets the PEM public key.
    #[must_use]
    pub fn with_public_key(mut self, pem: impl Into<String>) -> Self {
        self.public_key = Some(pem.into());
        self
    }

    /// Sets the PEM certificate chain.
    #[must_use]
    pub fn with_certificate(mut self, pem: impl Into<String>) -> Self {
        self.key_certificate = Some(pem.into());
        self
    }

    /// Sets the key use.
    #[must_use]
    pub const fn with_key_use(mut self, key_use: KeyUse) -> Self {
        self.key_use = key_use;
        self
    }

    /// Returns whether this is an active JWT signing key.
    #[must_use]
    pub fn is_active_jwt_signing(&self) -> bool {
        self.key_status == KeyStatus::Active && self.key_use == KeyUse::JwtSigning
    }

    /// Marks the key revoked.
    pub const fn revoke(&mut self) {
        self.key_status = KeyStatus::Revoked;
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("key_id", &self.key_id)
            .field("tenant_id", &self.tenant_id)
            .field("private_key", &"[REDACTED]")
            .field("passphrase", &self.passphrase.as_ref().map(|_| "[REDACTED]"))
            .field("key_use", &self.key_use)
            .field("key_status", &self.key_status)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}
