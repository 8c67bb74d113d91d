//! Cryptographically secure random generation.

use rand::Rng;

/// Generates `len` cryptographically secure random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates an opaque protocol handle: 32 random bytes, hex encoded.
///
/// Used for pre-authentication tokens, authorization codes, and refresh
/// tokens. Uniqueness rests on collision resistance alone.
#[must_use]
pub fn generate_opaque_token() -> String {
    hex::encode(random_bytes(32))
}
