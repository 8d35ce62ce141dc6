//! Shared test helpers for backfill tests.

#![allow(dead_code)]

use matchday_backfill::CancelFlag;
use matchday_crypto::{
    ContentCipher, ContentEncryptor, ContentKey, CryptoError, CryptoResult, DecryptOutcome,
};
use matchday_storage::{ContentPages, StorageError, StorageResult, WriteOutcome};
use matchday_types::{ContentRow, MessageId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

/// Deterministic id whose order follows `n`.
pub fn id(n: u64) -> MessageId {
    MessageId::parse(&format!("00000000-0000-4000-8000-{n:012x}")).unwrap()
}

/// Cipher over the all-zero key.
pub fn zero_cipher() -> ContentCipher {
    ContentCipher::new(&ContentKey::from_bytes([0u8; 32]))
}

pub fn random_cipher() -> ContentCipher {
    ContentCipher::new(&ContentKey::generate())
}

/// In-memory `messages.content` column with failure injection.
#[derive(Default)]
pub struct MemoryPages {
    rows: Mutex<BTreeMap<MessageId, String>>,
    fetched: Mutex<Vec<MessageId>>,
    fetch_calls: Mutex<usize>,
    writes: Mutex<usize>,
    fail_fetch_from: Option<usize>,
    failing_writes: HashSet<MessageId>,
    edits_before_write: HashMap<MessageId, String>,
}

impl MemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (MessageId, S)>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut map = store.rows.lock().unwrap();
            for (id, content) in rows {
                map.insert(id, content.into());
            }
        }
        store
    }

    /// Fetch call number `n` (zero-based) and every later one fails.
    pub fn fail_fetch_from(mut self, n: usize) -> Self {
        self.fail_fetch_from = Some(n);
        self
    }

    /// Writes to `id` return a database-level error.
    pub fn fail_writes_to(mut self, id: MessageId) -> Self {
        self.failing_writes.insert(id);
        self
    }

    /// A live writer replaces `id`'s content between the read and the write.
    pub fn edit_before_write(mut self, id: MessageId, content: &str) -> Self {
        self.edits_before_write.insert(id, content.to_string());
        self
    }

    pub fn content(&self, id: &MessageId) -> String {
        self.rows.lock().unwrap()[id].clone()
    }

    pub fn snapshot(&self) -> BTreeMap<MessageId, String> {
        self.rows.lock().unwrap().clone()
    }

    /// Every id returned by `fetch_page`, in the order it was returned.
    pub fn fetched(&self) -> Vec<MessageId> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl ContentPages for MemoryPages {
    fn fetch_page(&self, after: Option<&MessageId>, limit: usize) -> StorageResult<Vec<ContentRow>> {
        let call = {
            let mut calls = self.fetch_calls.lock().unwrap();
            *calls += 1;
            *calls - 1
        };
        if self.fail_fetch_from.is_some_and(|n| call >= n) {
            return Err(StorageError::Io(std::io::Error::other("connection reset")));
        }

        let rows = self.rows.lock().unwrap();
        let page: Vec<ContentRow> = rows
            .iter()
            .filter(|(id, _)| after.is_none_or(|cursor| *id > cursor))
            .take(limit)
            .map(|(id, content)| ContentRow::new(*id, content.clone()))
            .collect();
        self.fetched
            .lock()
            .unwrap()
            .extend(page.iter().map(|row| row.id));
        Ok(page)
    }

    fn write_content(
        &self,
        id: &MessageId,
        expected: &str,
        content: &str,
    ) -> StorageResult<WriteOutcome> {
        *self.writes.lock().unwrap() += 1;
        if self.failing_writes.contains(id) {
            return Err(StorageError::InvalidData(format!("write to {id} rejected")));
        }

        let mut rows = self.rows.lock().unwrap();
        if let Some(edit) = self.edits_before_write.get(id) {
            rows.insert(*id, edit.clone());
        }
        match rows.get_mut(id) {
            Some(current) if current == expected => {
                *current = content.to_string();
                Ok(WriteOutcome::Written)
            }
            _ => Ok(WriteOutcome::Conflict),
        }
    }
}

/// Delegates to a [`MemoryPages`] and raises the cancel flag once the given
/// number of fetches has been served, as a Ctrl-C arriving mid-page would.
pub struct CancelDuringFetch<'a> {
    pub inner: &'a MemoryPages,
    pub cancel: CancelFlag,
    pub after_fetches: usize,
}

impl ContentPages for CancelDuringFetch<'_> {
    fn fetch_page(&self, after: Option<&MessageId>, limit: usize) -> StorageResult<Vec<ContentRow>> {
        let page = self.inner.fetch_page(after, limit)?;
        if self.inner.fetch_calls() >= self.after_fetches {
            self.cancel.cancel();
        }
        Ok(page)
    }

    fn write_content(
        &self,
        id: &MessageId,
        expected: &str,
        content: &str,
    ) -> StorageResult<WriteOutcome> {
        self.inner.write_content(id, expected, content)
    }
}

/// Classifies like the zero-key cipher but refuses to seal.
pub struct RefusingEncryptor {
    pub cipher: ContentCipher,
    pub error: fn() -> CryptoError,
}

impl RefusingEncryptor {
    pub fn with_bad_key() -> Self {
        Self {
            cipher: zero_cipher(),
            error: || CryptoError::Configuration("key revoked".to_string()),
        }
    }

    pub fn with_aead_failure() -> Self {
        Self {
            cipher: zero_cipher(),
            error: || CryptoError::Encryption("aead error".to_string()),
        }
    }
}

impl ContentEncryptor for RefusingEncryptor {
    fn encrypt_for_storage(&self, _plaintext: &str) -> CryptoResult<String> {
        Err((self.error)())
    }

    fn decrypt_for_display(&self, token: &str) -> CryptoResult<String> {
        self.cipher.decrypt(token)
    }

    fn classify(&self, stored: &str) -> DecryptOutcome {
        self.cipher.try_decrypt(stored)
    }
}
