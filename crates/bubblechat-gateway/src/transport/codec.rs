//! Decode-once codec for the WebSocket lane.
//!
//! - Text frames => `Envelope` (lazy `RawValue` for data)
//! - Binary frames are not part of the store protocol and are surfaced only
//!   so the session loop can reject them
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use bubblechat_core::{
    error::{ChatError, Result},
    protocol::text,
};

#[derive(Debug)]
pub enum Inbound {
    Text { env: text::Envelope, bytes_len: usize },
    Binary { bytes_len: usize },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Frame size, computed before any parsing.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            let env: text::Envelope = serde_json::from_str(&s)
                .map_err(|e| ChatError::BadRequest(format!("invalid envelope json: {e}")))?;
            Ok(Inbound::Text { env, bytes_len })
        }
        Message::Binary(b) => Ok(Inbound::Binary { bytes_len: b.len() }),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
