//! Password-reset token generation and hashing.
//!
//! The raw token travels to the user by email; only its SHA-256 hash is
//! stored. Matching is a deterministic one-way transform of the raw
//! token against the stored hash.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random opaque reset token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_reset_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw reset token, hex-encoded.
///
/// This is the value stored as `user.reset_token_hash`.
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
