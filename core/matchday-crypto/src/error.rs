//! Error types for the encryption layer.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The content key is missing or not valid hex. Fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The content key decoded to the wrong number of bytes. Fatal.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The AEAD refused to seal the input.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Input is not shaped like a token (bad base64 or too short).
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Tag verification failed (wrong key or tampered data).
    #[error("authentication failed: token was not sealed with this key or was altered")]
    Authentication,

    /// The token authenticated but its plaintext is not UTF-8.
    #[error("decrypted content is not valid UTF-8")]
    InvalidUtf8,
}

impl CryptoError {
    /// Whether this error means the key itself is unusable.
    ///
    /// No cipher operation can succeed after one of these, so callers abort
    /// instead of retrying row by row.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidKeyLength { .. })
    }

    /// Whether this error means "the input is not a token for this key".
    #[must_use]
    pub fn is_not_a_token(&self) -> bool {
        matches!(self, Self::MalformedToken(_) | Self::Authentication)
    }
}
