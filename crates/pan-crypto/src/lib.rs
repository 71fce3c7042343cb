//! # PAN Crypto - Tokenization Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `keystream` | ChaCha20-Poly1305 | Nonce-bound token and tag derivation |
//! | `hashing` | BLAKE3 `derive_key` | Token key from a provisioning secret |
//!
//! ## Security Properties
//!
//! - **Nonce binding**: the token is the digit material XORed with a
//!   ChaCha20 keystream, so a fresh nonce yields an unrelated token.
//! - **Key hygiene**: `TokenKey` is zeroized on drop.
//! - **No PAN retention**: derivation works on a stack buffer that is wiped
//!   before returning.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod keystream;

// Re-exports
pub use errors::CryptoError;
pub use hashing::derive_token_key;
pub use keystream::{derive_token, TokenKey, TokenNonce, NONCE_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
