//! Message content sealing using AES-256-GCM.
//!
//! Provides authenticated encryption with a detached tag so the stored layout
//! is `nonce || tag || ciphertext`.

use crate::error::{CryptoError, CryptoResult};
use crate::key::ContentKey;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

/// Size of nonce in bytes (96 bits for AES-GCM).
pub const NONCE_SIZE: usize = 12;

/// Size of authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Smallest decoded token: a sealed empty string.
pub const MIN_TOKEN_SIZE: usize = NONCE_SIZE + TAG_SIZE;

/// The three fixed-position segments of a decoded token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedContent {
    /// The nonce used for encryption (unique per encryption).
    pub nonce: [u8; NONCE_SIZE],
    /// The detached authentication tag.
    pub tag: [u8; TAG_SIZE],
    /// The ciphertext, same length as the plaintext.
    pub ciphertext: Vec<u8>,
}

impl SealedContent {
    /// Returns the decoded size of the token.
    pub fn len(&self) -> usize {
        MIN_TOKEN_SIZE + self.ciphertext.len()
    }

    /// Returns true if the sealed plaintext was empty.
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Concatenates the segments in stored order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.tag);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Splits a decoded token into its segments.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() < MIN_TOKEN_SIZE {
            return Err(CryptoError::MalformedToken(format!(
                "{} bytes, need at least {MIN_TOKEN_SIZE}",
                bytes.len()
            )));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..NONCE_SIZE]);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&bytes[NONCE_SIZE..MIN_TOKEN_SIZE]);

        Ok(Self {
            nonce,
            tag,
            ciphertext: bytes[MIN_TOKEN_SIZE..].to_vec(),
        })
    }

    /// Encodes to the stored token form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decodes from the stored token form.
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::MalformedToken(format!("invalid base64: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Result of attempting to open a stored content value.
///
/// The backfill relies on the two failure variants meaning "this is not a
/// token for the current key". They are kept apart so callers that surface
/// them (the display path) can report which one happened.
#[derive(Debug, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The value is a token for this key; carries the plaintext bytes.
    Decrypted(Vec<u8>),
    /// Decoded to a token shape but the tag did not verify.
    AuthFailed,
    /// Not a token at all: bad base64 or too short.
    Malformed,
}

impl DecryptOutcome {
    /// Whether the value was sealed with the current key.
    pub fn is_sealed(&self) -> bool {
        matches!(self, Self::Decrypted(_))
    }
}

/// Seals and opens message content under one key.
///
/// Stateless apart from the expanded key schedule; safe to share across
/// threads.
#[derive(Clone)]
pub struct ContentCipher {
    cipher: Aes256Gcm,
}

impl ContentCipher {
    /// Creates a cipher for the given key.
    pub fn new(key: &ContentKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(GenericArray::from_slice(key.as_bytes())),
        }
    }

    /// Creates a cipher from the key in `MESSAGE_ENCRYPTION_KEY`.
    ///
    /// Fails fast with a configuration error before any sealing is attempted.
    pub fn from_env() -> CryptoResult<Self> {
        let key = ContentKey::from_env()?;
        Ok(Self::new(&key))
    }

    /// Seals raw bytes under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> CryptoResult<SealedContent> {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let mut ciphertext = plaintext.to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut ciphertext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(tag.as_slice());

        Ok(SealedContent {
            nonce,
            tag: tag_bytes,
            ciphertext,
        })
    }

    /// Opens sealed segments, verifying the tag before releasing any bytes.
    pub fn unseal(&self, sealed: &SealedContent) -> CryptoResult<Vec<u8>> {
        let mut buffer = sealed.ciphertext.clone();
        match self.cipher.decrypt_in_place_detached(
            Nonce::from_slice(&sealed.nonce),
            b"",
            &mut buffer,
            GenericArray::from_slice(&sealed.tag),
        ) {
            Ok(()) => Ok(buffer),
            Err(_) => Err(CryptoError::Authentication),
        }
    }

    /// Encrypts a message body into a stored token.
    ///
    /// Accepts any string, including the empty string.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        Ok(self.seal(plaintext.as_bytes())?.to_base64())
    }

    /// Opens a stored token to its raw plaintext bytes.
    pub fn open(&self, token: &str) -> CryptoResult<Vec<u8>> {
        let sealed = SealedContent::from_base64(token)?;
        self.unseal(&sealed)
    }

    /// Decrypts a stored token back to the original message body.
    pub fn decrypt(&self, token: &str) -> CryptoResult<String> {
        let plaintext = self.open(token)?;
        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Classifies a stored value by attempting to open it.
    ///
    /// Never fails: anything that is not a token for this key comes back as
    /// [`DecryptOutcome::AuthFailed`] or [`DecryptOutcome::Malformed`].
    pub fn try_decrypt(&self, token: &str) -> DecryptOutcome {
        match self.open(token) {
            Ok(plaintext) => DecryptOutcome::Decrypted(plaintext),
            Err(CryptoError::Authentication) => DecryptOutcome::AuthFailed,
            Err(_) => DecryptOutcome::Malformed,
        }
    }
}

impl std::fmt::Debug for ContentCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCipher")
            .field("algorithm", &"AES-256-GCM")
            .finish_non_exhaustive()
    }
}
