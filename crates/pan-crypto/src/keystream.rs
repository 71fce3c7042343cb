//! # Keystream Tokenization
//!
//! Derives a 64-bit token and a 16-bit tag from PAN digits under a
//! provisioned key and a per-record 96-bit nonce.
//!
//! ## Construction
//!
//! The digit values (one byte each, capture order) are encrypted in place
//! with ChaCha20-Poly1305. The associated data binds a domain label and the
//! record length. The ciphertext is XOR-folded into 8 bytes to form the
//! token; the first two bytes of the Poly1305 tag form the tag.
//!
//! - Same digits + same nonce => same token and tag.
//! - Same digits + different nonce => different keystream, so a different
//!   token with overwhelming probability.

use crate::CryptoError;
use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use zeroize::Zeroize;

/// Nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// Longest digit sequence accepted for tokenization.
const MAX_DIGITS: usize = 19;

const DOMAIN_LEN: usize = 12;

/// Domain label mixed into the associated data.
const TOKEN_DOMAIN: &[u8; DOMAIN_LEN] = b"pan-token-v1";

/// Token key (256-bit).
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct TokenKey([u8; 32]);

impl TokenKey {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    /// Generate random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// All-zero development key. Never use outside tests and demos.
    pub fn insecure_default() -> Self {
        Self([0u8; 32])
    }

    /// Whether this is the all-zero development key.
    pub fn is_insecure_default(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

/// Per-record nonce (96-bit).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TokenNonce([u8; NONCE_LEN]);

impl TokenNonce {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; NONCE_LEN] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidNonceLength {
                    expected: NONCE_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(array))
    }

    /// Generate random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// Get inner bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

/// Derive `(token64, tag16)` for a digit sequence.
///
/// # Errors
///
/// Returns `CryptoError::InvalidInput` if `digits` is empty, longer than 19,
/// or contains a value above 9, and `CryptoError::DerivationFailed` if the
/// cipher rejects the input.
pub fn derive_token(
    key: &TokenKey,
    nonce: &TokenNonce,
    digits: &[u8],
) -> Result<(u64, u16), CryptoError> {
    if digits.is_empty() || digits.len() > MAX_DIGITS {
        return Err(CryptoError::InvalidInput(format!(
            "digit count {} outside 1..={}",
            digits.len(),
            MAX_DIGITS
        )));
    }
    if digits.iter().any(|&d| d > 9) {
        return Err(CryptoError::InvalidInput(
            "digit value above 9".to_string(),
        ));
    }

    let mut buffer = [0u8; MAX_DIGITS];
    let message = &mut buffer[..digits.len()];
    message.copy_from_slice(digits);

    let mut aad = [0u8; DOMAIN_LEN + 1];
    aad[..DOMAIN_LEN].copy_from_slice(TOKEN_DOMAIN);
    aad[DOMAIN_LEN] = digits.len() as u8;

    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(nonce.as_bytes()), &aad, message)
        .map_err(|e| CryptoError::DerivationFailed(e.to_string()))?;

    let mut folded = [0u8; 8];
    for (i, byte) in message.iter().enumerate() {
        folded[i % 8] ^= byte;
    }
    buffer.zeroize();

    Ok((u64::from_le_bytes(folded), u16::from_le_bytes([tag[0], tag[1]])))
}
