//! At-rest encryption for direct message content.
//!
//! Message bodies are sealed with AES-256-GCM under a single process-wide
//! key and stored as a self-contained base64 token:
//!
//! ```text
//! base64( nonce[12] || tag[16] || ciphertext[n] )
//! ```
//!
//! The token carries no version or algorithm marker. A string that does not
//! decode, is shorter than 28 bytes, or fails tag verification is not a token
//! for the current key, which is how the backfill job tells legacy plaintext
//! apart from migrated rows (see [`DecryptOutcome`]).

mod cipher;
mod encryptor;
mod error;
mod key;

pub use cipher::{ContentCipher, DecryptOutcome, SealedContent, MIN_TOKEN_SIZE, NONCE_SIZE, TAG_SIZE};
pub use encryptor::ContentEncryptor;
pub use error::{CryptoError, CryptoResult};
pub use key::{ContentKey, KEY_ENV_VAR, KEY_HEX_LEN, KEY_SIZE};
