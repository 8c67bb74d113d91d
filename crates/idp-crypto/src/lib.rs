//! # idp-crypto
//!
//! Cryptographic building blocks for the identity provider protocol core.
//!
//! - [`random`] - opaque handles for protocol state and refresh grants
//! - [`hash`] - SHA-256 via aws-lc-rs, used for PKCE `S256`
//! - [`keys`] - RSA key material: PEM loading (including passphrase-encrypted
//!   PKCS#8), X.509 certificate chains, and JWK components
//! - [`compare`] - constant-time comparison of shared secrets
//!
//! Signing and verification of JWTs themselves is done with `jsonwebtoken`
//! in the protocol crate.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod compare;
pub mod error;
pub mod hash;
pub mod keys;
pub mod random;

pub use compare::constant_time_eq;
pub use error::{CryptoError, CryptoResult};
pub use hash::{pkce_s256_challenge, sha256};
pub use keys::{CertificateChain, RsaPublicComponents};
pub use random::{generate_opaque_token, random_bytes};
