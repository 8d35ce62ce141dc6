//! Persistent direct-message table.

use crate::error::{StorageError, StorageResult};
use crate::pages::{ContentPages, WriteOutcome};
use chrono::{DateTime, Utc};
use duckdb::{params, Connection};
use matchday_crypto::ContentEncryptor;
use matchday_types::{ContentRow, Message, MessageId, MessageType, NewMessage, UserId};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id VARCHAR PRIMARY KEY,
    sender_id VARCHAR NOT NULL,
    receiver_id VARCHAR NOT NULL,
    content VARCHAR NOT NULL,
    message_type VARCHAR NOT NULL DEFAULT 'text',
    is_read BOOLEAN NOT NULL DEFAULT FALSE,
    created_at BIGINT NOT NULL
);
"#;

const SELECT_COLUMNS: &str =
    "id, sender_id, receiver_id, content, message_type, is_read, created_at";

/// Column values as DuckDB hands them back, before parsing.
struct RawMessage {
    id: String,
    sender_id: String,
    receiver_id: String,
    content: String,
    message_type: String,
    is_read: bool,
    created_at: i64,
}

impl RawMessage {
    fn from_row(row: &duckdb::Row<'_>) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            sender_id: row.get(1)?,
            receiver_id: row.get(2)?,
            content: row.get(3)?,
            message_type: row.get(4)?,
            is_read: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Parses the row and opens its content.
    fn open(self, encryptor: &dyn ContentEncryptor) -> StorageResult<Message> {
        let id = parse_message_id(&self.id)?;
        let content = encryptor
            .decrypt_for_display(&self.content)
            .map_err(|source| StorageError::Integrity { id, source })?;

        Ok(Message {
            id,
            sender_id: parse_user_id(&self.sender_id)?,
            receiver_id: parse_user_id(&self.receiver_id)?,
            content,
            message_type: self
                .message_type
                .parse::<MessageType>()
                .map_err(|e| StorageError::InvalidData(e.to_string()))?,
            is_read: self.is_read,
            created_at: millis_to_datetime(self.created_at)?,
        })
    }
}

fn parse_message_id(s: &str) -> StorageResult<MessageId> {
    MessageId::parse(s).map_err(|e| StorageError::InvalidData(format!("message id {s:?}: {e}")))
}

fn parse_user_id(s: &str) -> StorageResult<UserId> {
    UserId::parse(s).map_err(|e| StorageError::InvalidData(format!("user id {s:?}: {e}")))
}

fn millis_to_datetime(ms: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::InvalidData(format!("created_at out of range: {ms}")))
}

/// DuckDB-backed message store.
pub struct MessageStore {
    conn: Connection,
}

impl MessageStore {
    /// Opens (or creates) the database at `path`.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = crate::open_duckdb_with_wal_recovery(path)?;
        Self::with_connection(conn)
    }

    /// Opens a throwaway in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Seals and stores a new message, returning it as the caller sees it.
    pub fn send_message(
        &self,
        message: &NewMessage,
        encryptor: &dyn ContentEncryptor,
    ) -> StorageResult<Message> {
        let token = encryptor
            .encrypt_for_storage(&message.content)
            .map_err(StorageError::Encryption)?;
        let id = MessageId::new();
        let created_at = millis_to_datetime(Utc::now().timestamp_millis())?;

        self.insert_row(&id, message, &token, created_at)?;
        debug!(%id, "message stored");

        Ok(Message {
            id,
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            content: message.content.clone(),
            message_type: message.message_type,
            is_read: false,
            created_at,
        })
    }

    /// Stores a message body exactly as given, without sealing it.
    ///
    /// Used when importing rows written before at-rest encryption existed;
    /// such rows stay readable only after the backfill has run.
    pub fn insert_plaintext(
        &self,
        id: MessageId,
        message: &NewMessage,
        created_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.insert_row(&id, message, &message.content, created_at)
    }

    fn insert_row(
        &self,
        id: &MessageId,
        message: &NewMessage,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO messages (id, sender_id, receiver_id, content, message_type, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, FALSE, ?)",
            params![
                id.to_string(),
                message.sender_id.to_string(),
                message.receiver_id.to_string(),
                content,
                message.message_type.as_str(),
                created_at.timestamp_millis(),
            ],
        )?;
        Ok(())
    }

    /// Loads one message with its content opened for display.
    ///
    /// Content that does not open under the current key is reported as
    /// [`StorageError::Integrity`].
    pub fn get_message(
        &self,
        id: &MessageId,
        encryptor: &dyn ContentEncryptor,
    ) -> StorageResult<Message> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM messages WHERE id = ?");
        let raw = match self
            .conn
            .query_row(&sql, params![id.to_string()], RawMessage::from_row)
        {
            Ok(raw) => raw,
            Err(duckdb::Error::QueryReturnedNoRows) => return Err(StorageError::NotFound(*id)),
            Err(e) => return Err(e.into()),
        };
        raw.open(encryptor)
    }

    /// Messages exchanged between two users, oldest first.
    pub fn conversation_messages(
        &self,
        a: &UserId,
        b: &UserId,
        limit: usize,
        encryptor: &dyn ContentEncryptor,
    ) -> StorageResult<Vec<Message>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM messages
             WHERE (sender_id = ? AND receiver_id = ?) OR (sender_id = ? AND receiver_id = ?)
             ORDER BY created_at, id
             LIMIT {limit}"
        );
        let (a, b) = (a.to_string(), b.to_string());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![a, b, b, a], RawMessage::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|raw| raw.open(encryptor)).collect()
    }

    /// Marks a message as read. Returns false if it does not exist.
    pub fn mark_read(&self, id: &MessageId) -> StorageResult<bool> {
        let changed = self.conn.execute(
            "UPDATE messages SET is_read = TRUE WHERE id = ?",
            params![id.to_string()],
        )?;
        Ok(changed > 0)
    }

    /// The stored content column verbatim (token or legacy plaintext).
    pub fn raw_content(&self, id: &MessageId) -> StorageResult<String> {
        match self.conn.query_row(
            "SELECT content FROM messages WHERE id = ?",
            params![id.to_string()],
            |row| row.get::<_, String>(0),
        ) {
            Ok(content) => Ok(content),
            Err(duckdb::Error::QueryReturnedNoRows) => Err(StorageError::NotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Total number of stored messages.
    pub fn count(&self) -> StorageResult<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM messages", params![], |row| row.get(0))?;
        usize::try_from(n).map_err(|_| StorageError::InvalidData(format!("negative count {n}")))
    }
}

impl ContentPages for MessageStore {
    fn fetch_page(&self, after: Option<&MessageId>, limit: usize) -> StorageResult<Vec<ContentRow>> {
        let raw: Vec<(String, String)> = match after {
            Some(cursor) => {
                let sql = format!(
                    "SELECT id, content FROM messages WHERE id > ? ORDER BY id LIMIT {limit}"
                );
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![cursor.to_string()], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let sql = format!("SELECT id, content FROM messages ORDER BY id LIMIT {limit}");
                let mut stmt = self.conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![], |row| Ok((row.get(0)?, row.get(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        raw.into_iter()
            .map(|(id, content)| Ok(ContentRow::new(parse_message_id(&id)?, content)))
            .collect()
    }

    fn write_content(
        &self,
        id: &MessageId,
        expected: &str,
        content: &str,
    ) -> StorageResult<WriteOutcome> {
        let changed = self.conn.execute(
            "UPDATE messages SET content = ? WHERE id = ? AND content = ?",
            params![content, id.to_string(), expected],
        )?;
        Ok(if changed == 1 {
            WriteOutcome::Written
        } else {
            WriteOutcome::Conflict
        })
    }
}
