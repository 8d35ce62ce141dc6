//! Content key loading and management.
//!
//! The key is supplied once at startup as 64 hex characters and injected into
//! [`crate::ContentCipher`] at construction. It is never re-read per call.

use crate::error::{CryptoError, CryptoResult};
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of the content key in bytes (256 bits for AES-256-GCM).
pub const KEY_SIZE: usize = 32;

/// Length of the hex form of the key.
pub const KEY_HEX_LEN: usize = KEY_SIZE * 2;

/// Environment variable holding the hex-encoded content key.
pub const KEY_ENV_VAR: &str = "MESSAGE_ENCRYPTION_KEY";

/// The symmetric key that seals message content, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ContentKey {
    bytes: [u8; KEY_SIZE],
}

impl ContentKey {
    /// Creates a key from raw bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Parses a key from its hex form.
    ///
    /// Surrounding whitespace is ignored. The error never echoes the input.
    pub fn from_hex(hex_key: &str) -> CryptoResult<Self> {
        let hex_key = hex_key.trim();
        if hex_key.is_empty() {
            return Err(CryptoError::Configuration(format!("{KEY_ENV_VAR} is empty")));
        }

        let mut decoded = hex::decode(hex_key).map_err(|_| {
            CryptoError::Configuration(format!(
                "{KEY_ENV_VAR} must be {KEY_HEX_LEN} hex characters"
            ))
        })?;

        if decoded.len() != KEY_SIZE {
            let actual = decoded.len();
            decoded.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual,
            });
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { bytes })
    }

    /// Loads the key from [`KEY_ENV_VAR`].
    pub fn from_env() -> CryptoResult<Self> {
        Self::from_env_var(KEY_ENV_VAR)
    }

    /// Loads the key from the named environment variable.
    pub fn from_env_var(name: &str) -> CryptoResult<Self> {
        match std::env::var(name) {
            Ok(value) => Self::from_hex(&value),
            Err(std::env::VarError::NotPresent) => {
                Err(CryptoError::Configuration(format!("{name} is not set")))
            }
            Err(std::env::VarError::NotUnicode(_)) => Err(CryptoError::Configuration(format!(
                "{name} is not valid unicode"
            ))),
        }
    }

    /// Generates a random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
