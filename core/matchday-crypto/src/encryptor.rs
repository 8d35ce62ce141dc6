//! Encryption seam for the live message path.
//!
//! The message store depends on `&dyn ContentEncryptor`; it never sees key
//! material. The backfill job classifies and reseals through it as well.
//! [`ContentCipher`] is the production implementation.

use crate::cipher::{ContentCipher, DecryptOutcome};
use crate::error::CryptoResult;

/// Seals content before it is persisted and opens it after it is read.
pub trait ContentEncryptor: Send + Sync {
    /// Called immediately before persisting a new message body.
    fn encrypt_for_storage(&self, plaintext: &str) -> CryptoResult<String>;

    /// Called immediately after reading a message body for display.
    ///
    /// Any failure is a data-integrity problem; implementations must not fall
    /// back to returning the stored value as plaintext.
    fn decrypt_for_display(&self, token: &str) -> CryptoResult<String>;

    /// Whether a stored value is already a token for this encryptor's key.
    fn classify(&self, stored: &str) -> DecryptOutcome;
}

impl ContentEncryptor for ContentCipher {
    fn encrypt_for_storage(&self, plaintext: &str) -> CryptoResult<String> {
        self.encrypt(plaintext)
    }

    fn decrypt_for_display(&self, token: &str) -> CryptoResult<String> {
        self.decrypt(token)
    }

    fn classify(&self, stored: &str) -> DecryptOutcome {
        self.try_decrypt(stored)
    }
}
