#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use serde_json::json;

use bubblechat_core::protocol::paths;
use bubblechat_core::{ClientCode, SessionId};
use bubblechat_gateway::chat::RoomDirectory;
use bubblechat_gateway::store::{MemoryStore, RealtimeStore};

fn setup() -> (Arc<MemoryStore>, RoomDirectory) {
    let store = Arc::new(MemoryStore::default());
    let dir = RoomDirectory::new(store.clone(), 3);
    (store, dir)
}

#[tokio::test]
async fn create_then_join() {
    let (_, dir) = setup();
    let me = SessionId::generate();

    let code = dir.create_room("  haicchat ", &me).await.unwrap();
    assert_eq!(code.as_str(), "HAICCHAT");

    let joined = dir.join_room("HaicChat").await.unwrap();
    assert_eq!(joined, code);

    let info = dir.room_info(&code).await.unwrap().unwrap();
    assert_eq!(info.name, "HAICCHAT");
    assert_eq!(info.created_by, me.as_str());
}

#[tokio::test]
async fn create_existing_room_fails() {
    let (_, dir) = setup();
    let me = SessionId::generate();
    dir.create_room("lovetext", &me).await.unwrap();

    let err = dir.create_room("LOVETEXT", &me).await.unwrap_err();
    assert_eq!(err.client_code(), ClientCode::AlreadyExists);
}

#[tokio::test]
async fn join_missing_room_fails() {
    let (_, dir) = setup();
    let err = dir.join_room("nowhere").await.unwrap_err();
    assert_eq!(err.client_code(), ClientCode::NotFound);
}

#[tokio::test]
async fn short_codes_rejected_before_any_store_call() {
    let (store, dir) = setup();
    let me = SessionId::generate();
    for raw in ["", "ab", "  x  "] {
        assert_eq!(dir.create_room(raw, &me).await.unwrap_err().client_code(), ClientCode::BadRequest);
        assert_eq!(dir.join_room(raw).await.unwrap_err().client_code(), ClientCode::BadRequest);
    }
    assert_eq!(store.metrics().store_ops.get(&[("op", "read")]), 0);
}

#[tokio::test]
async fn delete_removes_everything_below_the_room() {
    let (store, dir) = setup();
    let me = SessionId::generate();
    let code = dir.create_room("bubbletime", &me).await.unwrap();

    store
        .write(&paths::active_user(&code, &me), json!({ "user": "user1", "color": "pink", "timestamp": 1, "sessionId": me.as_str() }))
        .await
        .unwrap();
    store.push(&paths::bubbles(&code), json!({ "text": "hi" })).await.unwrap();

    dir.delete_room("BUBBLETIME").await.unwrap();

    assert_eq!(store.read_once(&paths::room(&code)).await.unwrap(), None);
    assert_eq!(dir.join_room("bubbletime").await.unwrap_err().client_code(), ClientCode::NotFound);
}

#[tokio::test]
async fn ensure_room_is_idempotent() {
    let (_, dir) = setup();
    let first = SessionId::generate();
    let second = SessionId::generate();

    let a = dir.ensure_room("suminbutt", &first).await.unwrap();
    let b = dir.ensure_room("SUMINBUTT", &second).await.unwrap();
    assert_eq!(a, b);

    // the original creator is kept
    let info = dir.room_info(&a).await.unwrap().unwrap();
    assert_eq!(info.created_by, first.as_str());
}

/// Two creators that both pass the existence check before either writes
/// both succeed; the later room info wins. This is the documented weak
/// guarantee of room creation, not a bug under test.
#[tokio::test]
async fn concurrent_create_race_is_accepted() {
    let (store, dir) = setup();
    let a = SessionId::generate();
    let b = SessionId::generate();

    let (ra, rb) = tokio::join!(dir.create_room("racy", &a), dir.create_room("racy", &b));
    let wins = [ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count();
    assert!(wins >= 1);

    let code = dir.join_room("racy").await.unwrap();
    assert!(store.read_once(&paths::room_info(&code)).await.unwrap().is_some());
}
