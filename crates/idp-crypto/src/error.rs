//! Cryptographic error types.

use thiserror::Error;

/// Errors raised while handling key material.
///
/// Messages never include key bytes or passphrases.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The private key could not be parsed or decrypted.
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// The public key could not be parsed.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// The certificate could not be parsed.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The key is not an RSA key.
    #[error("unsupported key type: {0}")]
    UnsupportedKey(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
