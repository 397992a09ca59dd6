#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use bubblechat_core::protocol::paths;
use bubblechat_core::{ClientCode, ColorIdentity, RoomCode, SessionId};
use bubblechat_gateway::chat::{PresenceRegistry, PresenceSnapshot, RoomDirectory};
use bubblechat_gateway::store::{MemoryStore, RealtimeStore};

async fn setup() -> (Arc<MemoryStore>, PresenceRegistry, RoomCode) {
    let store = Arc::new(MemoryStore::default());
    let dir = RoomDirectory::new(store.clone(), 3);
    let room = dir.create_room("haicchat", &SessionId::generate()).await.unwrap();
    (store.clone(), PresenceRegistry::new(store), room)
}

async fn snapshot(reg: &PresenceRegistry, room: &RoomCode) -> PresenceSnapshot {
    let mut sub = reg.subscribe(room).await.unwrap();
    sub.next().await.unwrap()
}

#[tokio::test]
async fn claim_then_collision() {
    let (_, reg, room) = setup().await;
    let a = SessionId::generate();
    let b = SessionId::generate();

    reg.claim_color(&room, &a, ColorIdentity::Pink, &snapshot(&reg, &room).await).await.unwrap();

    let snap = snapshot(&reg, &room).await;
    assert_eq!(snap.color_of(&a), Some(ColorIdentity::Pink));
    assert_eq!(snap.get(&a).unwrap().user, "user1");

    let err = reg.claim_color(&room, &b, ColorIdentity::Pink, &snap).await.unwrap_err();
    assert_eq!(err.client_code(), ClientCode::ColorTaken);
    assert!(snapshot(&reg, &room).await.get(&b).is_none());

    reg.claim_color(&room, &b, ColorIdentity::Blue, &snap).await.unwrap();
    let snap = snapshot(&reg, &room).await;
    assert_eq!(snap.len(), 2);
    assert!(snap.conflicts().is_empty());
}

#[tokio::test]
async fn own_color_never_blocks_self() {
    let (_, reg, room) = setup().await;
    let a = SessionId::generate();
    reg.claim_color(&room, &a, ColorIdentity::Green, &snapshot(&reg, &room).await).await.unwrap();

    let snap = snapshot(&reg, &room).await;
    assert!(!snap.is_taken(ColorIdentity::Green, &a));
    reg.claim_color(&room, &a, ColorIdentity::Green, &snap).await.unwrap();
    assert!(snap.available_colors(&a).contains(&ColorIdentity::Green));
    assert!(!snap.available_colors(&SessionId::generate()).contains(&ColorIdentity::Green));
}

#[tokio::test]
async fn change_color_to_same_is_noop_without_write() {
    let (store, reg, room) = setup().await;
    let a = SessionId::generate();
    reg.claim_color(&room, &a, ColorIdentity::Purple, &snapshot(&reg, &room).await).await.unwrap();

    let before = snapshot(&reg, &room).await;
    let writes = store.metrics().store_ops.get(&[("op", "write")]);

    let err = reg
        .change_color(&room, &a, Some(ColorIdentity::Purple), ColorIdentity::Purple, &before)
        .await
        .unwrap_err();
    assert_eq!(err.client_code(), ClientCode::NoOp);
    assert_eq!(store.metrics().store_ops.get(&[("op", "write")]), writes);
    assert_eq!(snapshot(&reg, &room).await, before);
}

#[tokio::test]
async fn change_color_overwrites_in_place() {
    let (_, reg, room) = setup().await;
    let a = SessionId::generate();
    reg.claim_color(&room, &a, ColorIdentity::Pink, &snapshot(&reg, &room).await).await.unwrap();

    let snap = snapshot(&reg, &room).await;
    reg.change_color(&room, &a, Some(ColorIdentity::Pink), ColorIdentity::Yellow, &snap)
        .await
        .unwrap();

    let snap = snapshot(&reg, &room).await;
    assert_eq!(snap.len(), 1);
    assert_eq!(snap.color_of(&a), Some(ColorIdentity::Yellow));
    assert_eq!(snap.get(&a).unwrap().user, "user5");
}

#[tokio::test]
async fn sequential_claims_keep_colors_exclusive() {
    let (_, reg, room) = setup().await;
    let sessions: Vec<SessionId> = (0..8).map(|_| SessionId::generate()).collect();

    // every session tries every color in turn, always against a fresh snapshot
    for s in &sessions {
        for c in ColorIdentity::ALL {
            let snap = snapshot(&reg, &room).await;
            let current = snap.color_of(s);
            let res = match current {
                None => reg.claim_color(&room, s, c, &snap).await,
                Some(cur) => reg.change_color(&room, s, Some(cur), c, &snap).await,
            };
            if let Err(e) = res {
                assert!(matches!(e.client_code(), ClientCode::ColorTaken | ClientCode::NoOp));
            }
            assert!(snapshot(&reg, &room).await.conflicts().is_empty());
        }
    }
    assert!(snapshot(&reg, &room).await.len() <= ColorIdentity::ALL.len());
}

/// Both sessions check against the same stale snapshot before either write
/// lands, so both win. Exclusivity is best-effort; the conflict is visible
/// to every subscriber and persists until someone moves.
#[tokio::test]
async fn stale_snapshot_race_is_an_accepted_exception() {
    let (_, reg, room) = setup().await;
    let a = SessionId::generate();
    let b = SessionId::generate();
    let stale = snapshot(&reg, &room).await;

    reg.claim_color(&room, &a, ColorIdentity::Pink, &stale).await.unwrap();
    reg.claim_color(&room, &b, ColorIdentity::Pink, &stale).await.unwrap();

    let snap = snapshot(&reg, &room).await;
    assert_eq!(snap.conflicts(), vec![ColorIdentity::Pink]);
}

#[tokio::test]
async fn leave_and_unload_remove_entry() {
    let (store, reg, room) = setup().await;
    let a = SessionId::generate();
    let b = SessionId::generate();
    let snap = snapshot(&reg, &room).await;
    reg.claim_color(&room, &a, ColorIdentity::Pink, &snap).await.unwrap();
    reg.claim_color(&room, &b, ColorIdentity::Blue, &snap).await.unwrap();

    reg.leave(&room, &a).await.unwrap();
    reg.leave_on_unload(&room, &b);

    assert!(snapshot(&reg, &room).await.is_empty());
    // room info is untouched
    assert!(store.read_once(&paths::room_info(&room)).await.unwrap().is_some());
}

#[tokio::test]
async fn subscription_streams_changes() {
    let (_, reg, room) = setup().await;
    let a = SessionId::generate();
    let mut sub = reg.subscribe(&room).await.unwrap();
    assert!(sub.next().await.unwrap().is_empty());

    reg.claim_color(&room, &a, ColorIdentity::Blue, &PresenceSnapshot::default()).await.unwrap();
    let snap = sub.next().await.unwrap();
    assert_eq!(snap.color_of(&a), Some(ColorIdentity::Blue));
    assert_eq!(snap.available_colors(&SessionId::generate()).len(), 4);
    sub.unsubscribe();
}
