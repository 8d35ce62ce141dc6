use chrono::{Duration, Utc};
use matchday_crypto::{ContentCipher, ContentKey, CryptoError};
use matchday_storage::{ContentPages, MessageStore, StorageError, WriteOutcome};
use matchday_types::{MessageId, MessageType, NewMessage, UserId};

fn cipher() -> ContentCipher {
    ContentCipher::new(&ContentKey::generate())
}

fn text(body: &str) -> NewMessage {
    NewMessage::text(UserId::random(), UserId::random(), body)
}

// ── send / get ───────────────────────────────────────────────────

#[test]
fn send_and_get_message() {
    let store = MessageStore::open_in_memory().unwrap();
    let cipher = cipher();

    let sent = store.send_message(&text("Halı saha 20:00?"), &cipher).unwrap();
    let loaded = store.get_message(&sent.id, &cipher).unwrap();

    assert_eq!(loaded, sent);
    assert_eq!(loaded.content, "Halı saha 20:00?");
    assert!(!loaded.is_read);
}

#[test]
fn sent_content_is_sealed_at_rest() {
    let store = MessageStore::open_in_memory().unwrap();
    let cipher = cipher();

    let sent = store.send_message(&text("secret plan"), &cipher).unwrap();
    let raw = store.raw_content(&sent.id).unwrap();

    assert_ne!(raw, "secret plan");
    assert_eq!(cipher.decrypt(&raw).unwrap(), "secret plan");
}

#[test]
fn get_missing_message_is_not_found() {
    let store = MessageStore::open_in_memory().unwrap();
    let id = MessageId::new();
    let err = store.get_message(&id, &cipher()).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(missing) if missing == id));
}

#[test]
fn get_legacy_plaintext_is_integrity_error() {
    let store = MessageStore::open_in_memory().unwrap();
    let id = MessageId::new();
    store
        .insert_plaintext(id, &text("Hello, I am plaintext"), Utc::now())
        .unwrap();

    let err = store.get_message(&id, &cipher()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Integrity {
            source: CryptoError::MalformedToken(_),
            ..
        }
    ));
}

#[test]
fn get_with_wrong_key_is_integrity_error() {
    let store = MessageStore::open_in_memory().unwrap();
    let sent = store.send_message(&text("hi"), &cipher()).unwrap();

    let err = store.get_message(&sent.id, &cipher()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Integrity {
            source: CryptoError::Authentication,
            ..
        }
    ));
    assert!(format!("{err}").contains(&sent.id.to_string()));
}

#[test]
fn message_type_is_persisted() {
    let store = MessageStore::open_in_memory().unwrap();
    let cipher = cipher();
    let msg = text("join lobby #4").with_type(MessageType::Invite);

    let sent = store.send_message(&msg, &cipher).unwrap();
    let loaded = store.get_message(&sent.id, &cipher).unwrap();
    assert_eq!(loaded.message_type, MessageType::Invite);
}

#[test]
fn mark_read() {
    let store = MessageStore::open_in_memory().unwrap();
    let cipher = cipher();
    let sent = store.send_message(&text("seen?"), &cipher).unwrap();

    assert!(store.mark_read(&sent.id).unwrap());
    assert!(store.get_message(&sent.id, &cipher).unwrap().is_read);
    assert!(!store.mark_read(&MessageId::new()).unwrap());
}

// ── conversation_messages ────────────────────────────────────────

#[test]
fn conversation_messages_both_directions_in_order() {
    let store = MessageStore::open_in_memory().unwrap();
    let cipher = cipher();
    let (ali, ayse, other) = (UserId::random(), UserId::random(), UserId::random());

    let base = Utc::now() - Duration::minutes(10);
    let plan = [
        (ali, ayse, "selam", 0),
        (ayse, ali, "selam, maç var mı?", 1),
        (ali, other, "unrelated", 2),
        (ali, ayse, "evet, 19:00", 3),
    ];
    for (from, to, body, minute) in plan {
        let token = cipher.encrypt(body).unwrap();
        let sealed = NewMessage::text(from, to, token);
        store
            .insert_plaintext(MessageId::new(), &sealed, base + Duration::minutes(minute))
            .unwrap();
    }

    let msgs = store.conversation_messages(&ayse, &ali, 50, &cipher).unwrap();
    let bodies: Vec<&str> = msgs.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(bodies, vec!["selam", "selam, maç var mı?", "evet, 19:00"]);
    assert!(msgs.iter().all(|m| m.involves(&ali) && m.involves(&ayse)));
}

#[test]
fn conversation_messages_respects_limit() {
    let store = MessageStore::open_in_memory().unwrap();
    let cipher = cipher();
    let (a, b) = (UserId::random(), UserId::random());
    for i in 0..5 {
        store
            .send_message(&NewMessage::text(a, b, format!("m{i}")), &cipher)
            .unwrap();
    }
    assert_eq!(store.conversation_messages(&a, &b, 3, &cipher).unwrap().len(), 3);
}

// ── ContentPages ─────────────────────────────────────────────────

#[test]
fn fetch_page_is_ordered_and_exclusive() {
    let store = MessageStore::open_in_memory().unwrap();
    let mut ids: Vec<MessageId> = (0..7)
        .map(|i| {
            let id = MessageId::from_uuid(uuid_v4());
            store.insert_plaintext(id, &text(&format!("row {i}")), Utc::now()).unwrap();
            id
        })
        .collect();
    ids.sort();

    let first = store.fetch_page(None, 3).unwrap();
    assert_eq!(first.iter().map(|r| r.id).collect::<Vec<_>>(), ids[..3]);

    let second = store.fetch_page(Some(&ids[2]), 3).unwrap();
    assert_eq!(second.iter().map(|r| r.id).collect::<Vec<_>>(), ids[3..6]);

    let last = store.fetch_page(Some(&ids[5]), 3).unwrap();
    assert_eq!(last.len(), 1);
    assert!(store.fetch_page(Some(&ids[6]), 3).unwrap().is_empty());
}

#[test]
fn fetch_page_returns_raw_content() {
    let store = MessageStore::open_in_memory().unwrap();
    let id = MessageId::new();
    store.insert_plaintext(id, &text("legacy body"), Utc::now()).unwrap();

    let page = store.fetch_page(None, 10).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].content, "legacy body");
}

#[test]
fn fetch_page_empty_store() {
    let store = MessageStore::open_in_memory().unwrap();
    assert!(store.fetch_page(None, 500).unwrap().is_empty());
}

#[test]
fn write_content_replaces_when_unchanged() {
    let store = MessageStore::open_in_memory().unwrap();
    let id = MessageId::new();
    store.insert_plaintext(id, &text("old"), Utc::now()).unwrap();

    let outcome = store.write_content(&id, "old", "new").unwrap();
    assert_eq!(outcome, WriteOutcome::Written);
    assert_eq!(store.raw_content(&id).unwrap(), "new");
}

#[test]
fn write_content_conflicts_when_changed() {
    let store = MessageStore::open_in_memory().unwrap();
    let id = MessageId::new();
    store.insert_plaintext(id, &text("edited meanwhile"), Utc::now()).unwrap();

    let outcome = store.write_content(&id, "what we read", "stale").unwrap();
    assert_eq!(outcome, WriteOutcome::Conflict);
    assert_eq!(store.raw_content(&id).unwrap(), "edited meanwhile");
}

#[test]
fn write_content_missing_row_conflicts() {
    let store = MessageStore::open_in_memory().unwrap();
    let outcome = store.write_content(&MessageId::new(), "a", "b").unwrap();
    assert_eq!(outcome, WriteOutcome::Conflict);
}

// ── persistence ──────────────────────────────────────────────────

#[test]
fn reopen_on_disk_keeps_messages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("messages.duckdb");
    let cipher = cipher();

    let sent = {
        let store = MessageStore::open(&path).unwrap();
        store.send_message(&text("kept"), &cipher).unwrap()
    };

    let store = MessageStore::open(&path).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.get_message(&sent.id, &cipher).unwrap().content, "kept");
}

#[test]
fn count_tracks_inserts() {
    let store = MessageStore::open_in_memory().unwrap();
    assert_eq!(store.count().unwrap(), 0);
    store.send_message(&text("a"), &cipher()).unwrap();
    store.insert_plaintext(MessageId::new(), &text("b"), Utc::now()).unwrap();
    assert_eq!(store.count().unwrap(), 2);
}

fn uuid_v4() -> uuid::Uuid {
    uuid::Uuid::new_v4()
}
