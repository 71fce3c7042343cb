//! Tokenizer gate
//!
//! Holds the provisioned key and the latched nonce, and fires exactly one
//! derivation per armed record.
//!
//! INVARIANTS:
//! - A token is derived only for a record that was armed, i.e. Luhn-valid.
//! - A latched nonce is consumed by exactly one derivation.
//! - An armed record with no nonce stays pending until one is latched, or
//!   until `cancel`/`reset`.

use pan_crypto::{derive_token, CryptoError, TokenKey, TokenNonce};
use pan_types::{PanRecord, TokenResult};

/// Pure derivation for a digit sequence.
pub fn tokenize(
    key: &TokenKey,
    nonce: &TokenNonce,
    digits: &[u8],
) -> Result<TokenResult, CryptoError> {
    let (token, tag) = derive_token(key, nonce, digits)?;
    Ok(TokenResult { token, tag })
}

/// Nonce latch plus fire-once gate
#[derive(Debug)]
pub struct Tokenizer {
    key: TokenKey,
    nonce: Option<TokenNonce>,
    pending: bool,
}

impl Tokenizer {
    pub fn new(key: TokenKey) -> Self {
        Self {
            key,
            nonce: None,
            pending: false,
        }
    }

    /// Latch a nonce for the next derivation. Replaces an unused one.
    pub fn latch_nonce(&mut self, nonce: TokenNonce) {
        if self.nonce.is_some() {
            tracing::debug!("Replacing unused nonce");
        }
        self.nonce = Some(nonce);
    }

    pub fn has_nonce(&self) -> bool {
        self.nonce.is_some()
    }

    /// Mark the current record as eligible for tokenization.
    pub fn arm(&mut self) {
        self.pending = true;
    }

    /// Drop a pending derivation. The latched nonce is kept.
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Armed and waiting for a nonce.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Derive the token if armed and a nonce is latched.
    ///
    /// Returns `Ok(None)` when nothing fires this step.
    pub fn try_fire(&mut self, record: &PanRecord) -> Result<Option<TokenResult>, CryptoError> {
        if !self.pending {
            return Ok(None);
        }
        let Some(nonce) = self.nonce.take() else {
            return Ok(None);
        };
        self.pending = false;
        tokenize(&self.key, &nonce, record.digits()).map(Some)
    }

    /// Clear the nonce latch and any pending derivation.
    pub fn reset(&mut self) {
        self.nonce = None;
        self.pending = false;
    }
}
