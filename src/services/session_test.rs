use std::sync::atomic::{AtomicBool, Ordering};

use super::*;
use crate::store::{MemoryStore, Versioned};

fn test_store() -> SessionStore {
    SessionStore::new(Arc::new(MemoryStore::new()), SessionBus::new(16), "test-session-")
}

// =============================================================================
// codes
// =============================================================================

#[test]
fn generated_code_matches_alphabet() {
    for _ in 0..50 {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }
}

#[test]
fn normalize_strips_hyphens_and_uppercases() {
    assert_eq!(normalize_code(" abc-12z "), "ABC12Z");
    assert_eq!(normalize_code("a-b-c-1-2-3"), "ABC123");
}

#[test]
fn validate_rejects_short_code() {
    let err = validate_code("abc12").unwrap_err();
    assert!(matches!(err, SessionError::InvalidCode(ref raw) if raw == "abc12"));
}

#[test]
fn validate_rejects_foreign_characters() {
    assert!(validate_code("ABC_12").is_err());
    assert!(validate_code("ÄBC123").is_err());
}

#[test]
fn validate_accepts_display_form() {
    assert_eq!(validate_code("a1b-2c3").unwrap(), "A1B2C3");
}

#[test]
fn display_code_groups_three_and_three() {
    assert_eq!(display_code("ABC123"), "ABC-123");
    assert_eq!(display_code("SHORT"), "SHORT");
}

#[test]
fn user_id_has_four_hex_digits() {
    let id = generate_user_id();
    let hex = id.strip_prefix("User-").expect("User- prefix");
    assert_eq!(hex.len(), 4);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
}

#[test]
fn bytes_to_hex_is_uppercase() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0x0a]), "DEAD0A");
}

#[test]
fn record_ids_carry_prefix() {
    let msg = ChatMessage::new("hi", "U1");
    let act = ActivityNotification::new("opened", "U1");
    assert!(msg.id.starts_with("msg-"));
    assert!(act.id.starts_with("act-"));
    assert_ne!(msg.id, ChatMessage::new("hi", "U1").id);
}

#[test]
fn session_data_uses_camel_case_sender() {
    let data = SessionData { messages: vec![ChatMessage::new("hi", "U1")], activity: vec![] };
    let json = serde_json::to_value(&data).unwrap();
    assert_eq!(json["messages"][0]["senderId"], "U1");
    assert!(json["activity"].as_array().unwrap().is_empty());
}

// =============================================================================
// store operations
// =============================================================================

#[tokio::test]
async fn create_then_exists() {
    let store = test_store();
    let code = store.create(None).await.unwrap();
    assert_eq!(code.len(), CODE_LEN);
    assert!(store.exists(&code).await.unwrap());
    assert_eq!(store.read(&code).await.unwrap(), SessionData::default());
}

#[tokio::test]
async fn create_publishes_empty_record() {
    let store = test_store();
    let mut rx = store.bus().subscribe();
    let code = store.create(None).await.unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.key, store.key_for(&code));
    let data: SessionData = serde_json::from_str(&event.new_value).unwrap();
    assert_eq!(data, SessionData::default());
}

#[tokio::test]
async fn read_missing_session_is_empty() {
    let store = test_store();
    assert!(!store.exists("ZZZ999").await.unwrap());
    assert_eq!(store.read("ZZZ999").await.unwrap(), SessionData::default());
}

#[tokio::test]
async fn appends_preserve_order_and_count() {
    let store = test_store();
    let code = store.create(None).await.unwrap();

    for i in 0..5 {
        store
            .append_message(&code, ChatMessage::new(format!("m{i}"), "U1"), None)
            .await
            .unwrap();
    }

    let data = store.read(&code).await.unwrap();
    let texts: Vec<&str> = data.messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["m0", "m1", "m2", "m3", "m4"]);
}

#[tokio::test]
async fn read_is_idempotent() {
    let store = test_store();
    let code = store.create(None).await.unwrap();
    store
        .append_activity(&code, ActivityNotification::new("x", "U2"), None)
        .await
        .unwrap();

    assert_eq!(store.read(&code).await.unwrap(), store.read(&code).await.unwrap());
}

#[tokio::test]
async fn scenario_hi_from_u1() {
    let store = test_store();
    let code = store.create(None).await.unwrap();
    store
        .append_message(&code, ChatMessage::new("hi", "U1"), None)
        .await
        .unwrap();

    let data = store.read(&code).await.unwrap();
    assert_eq!(data.messages.len(), 1);
    assert_eq!(data.messages[0].text, "hi");
    assert_eq!(data.messages[0].sender_id, "U1");
}

#[tokio::test]
async fn append_to_missing_session_is_not_found() {
    let store = test_store();
    let err = store
        .append_message("NOPE00", ChatMessage::new("hi", "U1"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test]
async fn append_publishes_origin() {
    let store = test_store();
    let code = store.create(None).await.unwrap();
    let mut rx = store.bus().subscribe();
    let origin = Uuid::new_v4();

    store
        .append_message(&code, ChatMessage::new("hi", "U1"), Some(origin))
        .await
        .unwrap();

    let event = rx.recv().await.unwrap();
    assert_eq!(event.origin, Some(origin));
    assert!(event.new_value.contains("\"hi\""));
}

#[tokio::test]
async fn concurrent_appends_both_survive() {
    let store = test_store();
    let code = store.create(None).await.unwrap();

    let a = {
        let store = store.clone();
        let code = code.clone();
        tokio::spawn(async move {
            for i in 0..20 {
                store
                    .append_message(&code, ChatMessage::new(format!("a{i}"), "A"), None)
                    .await
                    .unwrap();
            }
        })
    };
    let b = {
        let store = store.clone();
        let code = code.clone();
        tokio::spawn(async move {
            for i in 0..20 {
                store
                    .append_message(&code, ChatMessage::new(format!("b{i}"), "B"), None)
                    .await
                    .unwrap();
            }
        })
    };
    a.await.unwrap();
    b.await.unwrap();

    let data = store.read(&code).await.unwrap();
    assert_eq!(data.messages.len(), 40);
}

/// Store that lets one foreign write slip in between the first read and the
/// first compare-and-set, the way a second tab would.
struct InterleavingStore {
    inner: MemoryStore,
    interfered: AtomicBool,
}

#[async_trait::async_trait]
impl KvStore for InterleavingStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StoreError> {
        self.inner.get(key).await
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<u64>,
        value: String,
    ) -> Result<Option<u64>, StoreError> {
        if expected.is_some() && !self.interfered.swap(true, Ordering::SeqCst) {
            let current = self.inner.get(key).await?.expect("seeded");
            let mut data: SessionData = serde_json::from_str(&current.value).unwrap();
            data.messages.push(ChatMessage::new("from other tab", "OTHER"));
            self.inner
                .compare_and_set(key, Some(current.version), serde_json::to_string(&data).unwrap())
                .await?;
        }
        self.inner.compare_and_set(key, expected, value).await
    }
}

#[tokio::test]
async fn conflicting_write_is_retried_not_overwritten() {
    let kv = Arc::new(InterleavingStore { inner: MemoryStore::new(), interfered: AtomicBool::new(false) });
    let store = SessionStore::new(kv, SessionBus::new(4), "p-");
    let code = store.create(None).await.unwrap();

    store
        .append_message(&code, ChatMessage::new("mine", "ME"), None)
        .await
        .unwrap();

    let texts: Vec<String> = store
        .read(&code)
        .await
        .unwrap()
        .messages
        .into_iter()
        .map(|m| m.text)
        .collect();
    assert_eq!(texts, ["from other tab", "mine"]);
}

#[tokio::test]
async fn corrupt_record_reads_empty_but_rejects_append() {
    let kv = Arc::new(MemoryStore::new());
    let store = SessionStore::new(kv.clone(), SessionBus::new(4), "p-");
    kv.compare_and_set("p-BAD000", None, "not json".into())
        .await
        .unwrap();

    assert!(store.exists("BAD000").await.unwrap());
    assert_eq!(store.read("BAD000").await.unwrap(), SessionData::default());
    let err = store
        .append_message("BAD000", ChatMessage::new("x", "U"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Corrupt(_)));
}
