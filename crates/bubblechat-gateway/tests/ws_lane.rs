#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use bubblechat_core::protocol::paths::StorePath;
use bubblechat_core::protocol::text::Envelope;
use bubblechat_gateway::app_state::AppState;
use bubblechat_gateway::config;
use bubblechat_gateway::obs::ChatMetrics;
use bubblechat_gateway::store::{MemoryStore, RealtimeStore};
use bubblechat_gateway::transport::ws::StoreLane;

fn lane(queue: usize) -> (Arc<MemoryStore>, StoreLane, mpsc::Receiver<Message>) {
    let metrics = Arc::new(ChatMetrics::default());
    let store = Arc::new(MemoryStore::new(Arc::clone(&metrics)));
    let cfg = config::load_from_str("version: 1\n").unwrap();
    let app = AppState::with_store(cfg, store.clone(), metrics);
    let (tx, rx) = mpsc::channel(queue);
    (store, StoreLane::new(app, tx), rx)
}

fn env(v: Value) -> Envelope {
    serde_json::from_str(&v.to_string()).unwrap()
}

fn p(s: &str) -> StorePath {
    StorePath::parse(s).unwrap()
}

async fn next_frame(rx: &mut mpsc::Receiver<Message>) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("frame expected")
        .expect("queue open");
    match msg {
        Message::Text(s) => serde_json::from_str(&s).unwrap(),
        other => panic!("unexpected frame: {other:?}"),
    }
}

#[tokio::test]
async fn sub_streams_current_value_then_changes() {
    let (store, mut lane, mut rx) = lane(8);
    store.write(&p("rooms/HAICCHAT/roomInfo"), json!({"name": "HAICCHAT"})).await.unwrap();

    let ack = lane
        .handle(env(json!({"v": 1, "svc": "store", "type": "sub", "seq": 7, "path": "rooms/HAICCHAT"})))
        .await
        .unwrap();
    assert!(ack.is_none());

    let first = next_frame(&mut rx).await;
    assert_eq!(first["type"], "value");
    assert_eq!(first["seq"], 7);
    assert_eq!(first["path"], "rooms/HAICCHAT");
    assert_eq!(first["data"]["roomInfo"]["name"], "HAICCHAT");

    lane.handle(env(json!({
        "v": 1, "svc": "store", "type": "write", "seq": 8,
        "path": "rooms/HAICCHAT/bubbles/k1", "data": {"text": "hi"}
    })))
    .await
    .unwrap();
    let second = next_frame(&mut rx).await;
    assert_eq!(second["seq"], 7);
    assert_eq!(second["data"]["bubbles"]["k1"]["text"], "hi");
}

#[tokio::test]
async fn sub_on_missing_path_sends_null() {
    let (_, mut lane, mut rx) = lane(8);
    lane.handle(env(json!({"v": 1, "svc": "store", "type": "sub", "seq": 1, "path": "rooms/NONE"})))
        .await
        .unwrap();
    assert!(next_frame(&mut rx).await["data"].is_null());
}

#[tokio::test]
async fn unsub_detaches_the_subscription() {
    let (store, mut lane, mut rx) = lane(8);
    lane.handle(env(json!({"v": 1, "svc": "store", "type": "sub", "seq": 3, "path": "rooms"})))
        .await
        .unwrap();
    next_frame(&mut rx).await;
    assert_eq!(store.watcher_count(), 1);
    assert_eq!(lane.active_subscriptions(), 1);

    lane.handle(env(json!({"v": 1, "svc": "store", "type": "unsub", "seq": 3})))
        .await
        .unwrap();
    assert_eq!(store.watcher_count(), 0);
    assert_eq!(lane.active_subscriptions(), 0);

    // no more frames for that seq
    store.write(&p("rooms/X/roomInfo"), json!(1)).await.unwrap();
    assert!(rx.try_recv().is_err());

    // unsub of an unknown seq is acknowledged
    assert!(lane
        .handle(env(json!({"v": 1, "svc": "store", "type": "unsub", "seq": 99})))
        .await
        .is_ok());
}

#[tokio::test]
async fn dropping_the_lane_detaches_everything() {
    let (store, mut lane, _rx) = lane(8);
    for seq in 1..=3u64 {
        lane.handle(env(json!({"v": 1, "svc": "store", "type": "sub", "seq": seq, "path": "rooms"})))
            .await
            .unwrap();
    }
    assert_eq!(store.watcher_count(), 3);
    drop(lane);
    for _ in 0..20 {
        if store.watcher_count() == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(store.watcher_count(), 0);
}

#[tokio::test]
async fn read_write_delete() {
    let (_, mut lane, _rx) = lane(8);
    let read = json!({"v": 1, "svc": "store", "type": "read", "seq": 1, "path": "rooms/A/roomInfo"});

    assert_eq!(lane.handle(env(read.clone())).await.unwrap(), Some(Value::Null));
    lane.handle(env(json!({
        "v": 1, "svc": "store", "type": "write", "seq": 2,
        "path": "rooms/A/roomInfo", "data": {"name": "A"}
    })))
    .await
    .unwrap();
    assert_eq!(lane.handle(env(read.clone())).await.unwrap(), Some(json!({"name": "A"})));

    lane.handle(env(json!({"v": 1, "svc": "store", "type": "delete", "seq": 3, "path": "rooms/A"})))
        .await
        .unwrap();
    assert_eq!(lane.handle(env(read)).await.unwrap(), Some(Value::Null));
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let (_, mut lane, _rx) = lane(8);
    let cases = [
        (json!({"v": 1, "svc": "store", "type": "write", "seq": 1, "path": "rooms/A"}), "BAD_REQUEST"),
        (json!({"v": 2, "svc": "store", "type": "read", "seq": 1, "path": "rooms"}), "UNSUPPORTED_VERSION"),
        (json!({"v": 1, "svc": "chat", "type": "read", "seq": 1, "path": "rooms"}), "BAD_REQUEST"),
        (json!({"v": 1, "svc": "store", "type": "sub", "path": "rooms"}), "BAD_REQUEST"),
        (json!({"v": 1, "svc": "store", "type": "read", "seq": 1}), "BAD_REQUEST"),
        (json!({"v": 1, "svc": "store", "type": "read", "seq": 1, "path": "rooms/a.b"}), "BAD_REQUEST"),
        (json!({"v": 1, "svc": "store", "type": "merge", "seq": 1, "path": "rooms"}), "BAD_REQUEST"),
    ];
    for (req, code) in cases {
        let err = lane.handle(env(req.clone())).await.unwrap_err();
        assert_eq!(err.client_code().as_str(), code, "{req}");
    }
}

#[tokio::test]
async fn duplicate_seq_is_rejected() {
    let (store, mut lane, _rx) = lane(8);
    let sub = json!({"v": 1, "svc": "store", "type": "sub", "seq": 5, "path": "rooms"});
    lane.handle(env(sub.clone())).await.unwrap();
    let err = lane.handle(env(sub)).await.unwrap_err();
    assert_eq!(err.client_code().as_str(), "BAD_REQUEST");
    assert_eq!(store.watcher_count(), 1);
}

#[tokio::test]
async fn reply_frames_echo_seq() {
    let (_, mut lane, _rx) = lane(8);
    let ok: Value = serde_json::from_str(
        &lane
            .reply(env(json!({"v": 1, "svc": "store", "type": "read", "seq": 11, "path": "rooms"})))
            .await,
    )
    .unwrap();
    assert_eq!(ok["type"], "ok");
    assert_eq!(ok["seq"], 11);
    assert!(ok["data"].is_null());

    let err: Value = serde_json::from_str(
        &lane
            .reply(env(json!({"v": 9, "svc": "store", "type": "read", "seq": 12, "path": "rooms"})))
            .await,
    )
    .unwrap();
    assert_eq!(err["type"], "error");
    assert_eq!(err["seq"], 12);
    assert_eq!(err["data"]["code"], "UNSUPPORTED_VERSION");
}

#[tokio::test]
async fn slow_reader_gets_the_newest_snapshot() {
    let (store, mut lane, mut rx) = lane(1);
    lane.handle(env(json!({"v": 1, "svc": "store", "type": "sub", "seq": 1, "path": "counter"})))
        .await
        .unwrap();
    // initial value
    assert!(next_frame(&mut rx).await["data"].is_null());

    tokio::time::sleep(Duration::from_millis(10)).await;
    // the forwarder holds the next slot and waits for a change; many
    // writes collapse into one frame with the last value
    for i in 1..=50 {
        store.write(&p("counter"), json!(i)).await.unwrap();
    }
    let frame = next_frame(&mut rx).await;
    assert_eq!(frame["data"], 50);
    assert!(rx.try_recv().is_err());
}
