//! WebSocket lane of the store gateway.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS
//! - Lifecycle: ping/pong + idle timeout
//! - Size check before decode, then decode-once into `Envelope`
//! - Serve `store` requests: sub / unsub / read / write / delete
//!
//! Each `sub` spawns a forwarder that pushes `value` frames tagged with the
//! subscription's `seq` into the outbound queue. Forwarders are aborted on
//! `unsub` and when the connection ends, which drops (and so detaches) their
//! subscriptions.
//!
//! Only forwarders write into the outbound queue; the session loop drains it
//! and writes its own replies straight to the socket, so it never waits on
//! itself. A forwarder reserves a queue slot before taking the next snapshot:
//! a slow client delays frames instead of losing them, and the frame that
//! goes out is the newest value.

use std::collections::HashMap;

use axum::{
    extract::{ws::Message, ws::WebSocket, ws::WebSocketUpgrade, State},
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::Instrument;

use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::protocol::paths::StorePath;
use bubblechat_core::protocol::text::Envelope;
use bubblechat_core::SessionId;

use crate::app_state::AppState;
use crate::store::Subscription;
use crate::transport::codec::{decode, frame_len, Inbound};

const OUTBOUND_QUEUE: usize = 1024;

// --------------------
// JSON builders
// --------------------
fn sys_hello_json(conn: &str) -> String {
    json!({
        "v": 1,
        "svc": "sys",
        "type": "hello",
        "data": { "conn": conn }
    })
    .to_string()
}

fn sys_error_json(seq: Option<u64>, code: &str, msg: &str) -> String {
    json!({
        "v": 1,
        "svc": "sys",
        "type": "error",
        "seq": seq,
        "data": { "code": code, "msg": msg }
    })
    .to_string()
}

fn store_ok_json(seq: Option<u64>, data: Option<Value>) -> String {
    json!({
        "v": 1,
        "svc": "store",
        "type": "ok",
        "seq": seq,
        "data": data
    })
    .to_string()
}

fn store_value_json(seq: u64, path: &str, value: Option<&Value>) -> String {
    json!({
        "v": 1,
        "svc": "store",
        "type": "value",
        "seq": seq,
        "path": path,
        "data": value
    })
    .to_string()
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    app.metrics().ws_upgrades.inc(&[]);
    ws.max_frame_size(app.cfg().gateway.max_frame_bytes)
        .on_upgrade(move |socket| async move {
            let conn = SessionId::generate();
            let span = tracing::info_span!("ws_conn", conn = %conn);
            async move {
                app.metrics().ws_active_sessions.inc(&[]);
                if let Err(e) = run_session(&app, &conn, socket).await {
                    tracing::debug!(error = %e, "ws session ended with error");
                }
                app.metrics().ws_active_sessions.dec(&[]);
            }
            .instrument(span)
            .await
        })
}

// --------------------
// Store lane
// --------------------

/// Store requests of one connection and the forwarders of its subscriptions.
pub struct StoreLane {
    app: AppState,
    out: mpsc::Sender<Message>,
    subs: HashMap<u64, JoinHandle<()>>,
}

impl StoreLane {
    /// `out` receives the `value` frames of subscriptions.
    pub fn new(app: AppState, out: mpsc::Sender<Message>) -> Self {
        Self {
            app,
            out,
            subs: HashMap::new(),
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subs.len()
    }

    /// Serve one request and build its `ok` or `error` reply frame.
    pub async fn reply(&mut self, env: Envelope) -> String {
        let seq = env.seq;
        let msg_type = env.msg_type.clone();
        let res = self.handle(env).await;
        let outcome = if res.is_ok() { "ok" } else { "error" };
        self.app
            .metrics()
            .ws_requests
            .inc(&[("type", type_label(&msg_type)), ("outcome", outcome)]);
        match res {
            Ok(data) => store_ok_json(seq, data),
            Err(e) => sys_error_json(seq, e.client_code().as_str(), &e.to_string()),
        }
    }

    /// Serve one request; `Ok` carries the optional `data` of the ack.
    pub async fn handle(&mut self, env: Envelope) -> Result<Option<Value>> {
        if env.v != 1 {
            return Err(ChatError::UnsupportedVersion);
        }
        if env.svc != "store" {
            return Err(ChatError::BadRequest(format!("unknown svc: {}", env.svc)));
        }
        let store = self.app.store();

        match env.msg_type.as_str() {
            "sub" => {
                let path = require_path(&env)?;
                let seq = require_seq(&env)?;
                if self.subs.contains_key(&seq) {
                    return Err(ChatError::BadRequest(format!("seq {seq} already subscribed")));
                }
                let sub = store.subscribe(&path).await?;
                let task = tokio::spawn(forward(sub, seq, self.out.clone()));
                self.subs.insert(seq, task);
                Ok(None)
            }
            "unsub" => {
                let seq = require_seq(&env)?;
                if let Some(task) = self.subs.remove(&seq) {
                    task.abort();
                    // the subscription is detached once the task is gone
                    let _ = task.await;
                }
                Ok(None)
            }
            "read" => {
                let path = require_path(&env)?;
                Ok(Some(store.read_once(&path).await?.unwrap_or(Value::Null)))
            }
            "write" => {
                let path = require_path(&env)?;
                let raw = env
                    .data
                    .as_ref()
                    .ok_or_else(|| ChatError::BadRequest("store.write requires data".into()))?;
                let value: Value = serde_json::from_str(raw.get())
                    .map_err(|e| ChatError::BadRequest(format!("store.write invalid data: {e}")))?;
                store.write(&path, value).await?;
                Ok(None)
            }
            "delete" => {
                let path = require_path(&env)?;
                store.delete(&path).await?;
                Ok(None)
            }
            other => Err(ChatError::BadRequest(format!("unknown store type: {other}"))),
        }
    }
}

impl Drop for StoreLane {
    fn drop(&mut self) {
        for (_, task) in self.subs.drain() {
            task.abort();
        }
    }
}

async fn forward(mut sub: Subscription, seq: u64, out: mpsc::Sender<Message>) {
    let shown = sub.path().to_string();
    loop {
        let Ok(permit) = out.reserve().await else { break };
        let Some(value) = sub.next().await else { break };
        permit.send(Message::Text(store_value_json(seq, &shown, value.as_ref())));
    }
}

/// Metric label for a request type; unknown types share one label.
fn type_label(msg_type: &str) -> &'static str {
    match msg_type {
        "sub" => "sub",
        "unsub" => "unsub",
        "read" => "read",
        "write" => "write",
        "delete" => "delete",
        _ => "other",
    }
}

fn require_path(env: &Envelope) -> Result<StorePath> {
    let raw = env
        .path
        .as_deref()
        .ok_or_else(|| ChatError::BadRequest(format!("store.{} requires path", env.msg_type)))?;
    StorePath::parse(raw)
}

fn require_seq(env: &Envelope) -> Result<u64> {
    env.seq
        .ok_or_else(|| ChatError::BadRequest(format!("store.{} requires seq", env.msg_type)))
}

// --------------------
// Core session loop
// --------------------
async fn run_session(app: &AppState, conn: &SessionId, socket: WebSocket) -> Result<()> {
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
    let (mut ws_tx, mut ws_rx) = socket.split();
    let closed = |_| ChatError::TransientFailure("websocket closed".into());

    ws_tx
        .send(Message::Text(sys_hello_json(conn.as_str())))
        .await
        .map_err(closed)?;

    let gw = &app.cfg().gateway;
    let ping_every = Duration::from_millis(gw.ping_interval_ms);
    let idle_timeout = Duration::from_millis(gw.idle_timeout_ms);
    let max_frame = gw.max_frame_bytes;

    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let mut last_activity = Instant::now();
    let mut lane = StoreLane::new(app.clone(), out_tx);

    tracing::info!("ws session started");

    loop {
        tokio::select! {
            // subscription frames
            Some(m) = out_rx.recv() => {
                ws_tx.send(m).await.map_err(closed)?;
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else { break; };

                last_activity = Instant::now();

                if frame_len(&msg) > max_frame {
                    let err = sys_error_json(None, "BAD_REQUEST", "frame too large");
                    ws_tx.send(Message::Text(err)).await.map_err(closed)?;
                    continue;
                }

                let inbound = match decode(msg) {
                    Ok(i) => i,
                    Err(e) => {
                        app.metrics().decode_errors.inc(&[]);
                        let err = sys_error_json(None, e.client_code().as_str(), &e.to_string());
                        ws_tx.send(Message::Text(err)).await.map_err(closed)?;
                        continue;
                    }
                };

                match inbound {
                    Inbound::Text { env, bytes_len } => {
                        tracing::trace!(msg_type = %env.msg_type, bytes_len, "store request");
                        let reply = lane.reply(env).await;
                        ws_tx.send(Message::Text(reply)).await.map_err(closed)?;
                    }
                    Inbound::Binary { bytes_len } => {
                        tracing::debug!(bytes_len, "binary frame rejected");
                        let err = sys_error_json(None, "BAD_REQUEST", "binary frames are not supported");
                        ws_tx.send(Message::Text(err)).await.map_err(closed)?;
                    }
                    Inbound::Ping(payload) => {
                        ws_tx.send(Message::Pong(payload)).await.map_err(closed)?;
                    }
                    Inbound::Pong(_) => {}
                    Inbound::Close => break,
                }
            }

            // ping
            _ = ping_tick.tick() => {
                ws_tx.send(Message::Ping(Vec::new())).await.map_err(closed)?;
            }

            // idle timeout
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                if last_activity.elapsed() >= idle_timeout {
                    let _ = ws_tx.send(Message::Text(sys_error_json(None, "TIMEOUT", "idle timeout"))).await;
                    break;
                }
            }
        }
    }

    tracing::info!(subscriptions = lane.active_subscriptions(), "ws session closed");
    Ok(())
}
