//! # Token Key Derivation
//!
//! Turns a provisioning secret into the 256-bit token key with BLAKE3's
//! key-derivation mode. The context string pins the derived key to this use.

use crate::keystream::TokenKey;

/// KDF context for the token key.
pub const TOKEN_KEY_CONTEXT: &str = "pan-pipeline 2024 tokenizer key v1";

/// Derive key from context and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Derive the token key from a provisioning secret.
pub fn derive_token_key(secret: &[u8]) -> TokenKey {
    TokenKey::from_bytes(blake3_derive_key(TOKEN_KEY_CONTEXT, secret))
}
