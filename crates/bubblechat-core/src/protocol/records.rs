//! Records stored in the key tree and snapshot decoders.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::clock::now_millis;
use crate::color::ColorIdentity;
use crate::error::{ChatError, Result};
use crate::room::RoomCode;
use crate::session::SessionId;

/// `rooms/{code}/roomInfo`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub name: String,
    pub created_at: u64,
    pub created_by: String,
}

impl RoomInfo {
    pub fn new(code: &RoomCode, created_by: &SessionId) -> Self {
        Self {
            name: code.to_string(),
            created_at: now_millis(),
            created_by: created_by.to_string(),
        }
    }
}

/// `rooms/{code}/activeUsers/{sessionId}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub user: String,
    pub color: ColorIdentity,
    pub timestamp: u64,
    pub session_id: SessionId,
}

impl PresenceEntry {
    pub fn new(session: &SessionId, color: ColorIdentity) -> Self {
        Self {
            user: color.user_tag().to_string(),
            color,
            timestamp: now_millis(),
            session_id: session.clone(),
        }
    }
}

/// `rooms/{code}/bubbles/{bubbleKey}`
///
/// `is_popping` is always written `false`; the popping state is local.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleRecord {
    pub id: u64,
    pub text: String,
    pub color: ColorIdentity,
    pub user: String,
    pub x: f64,
    pub timestamp: u64,
    #[serde(default)]
    pub is_popping: bool,
}

/// Serialize a record for a store write.
pub fn encode<T: Serialize>(record: &T) -> Result<Value> {
    serde_json::to_value(record).map_err(|e| ChatError::Internal(format!("record encode failed: {e}")))
}

/// Decode a single record (e.g. a `read_once` result).
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ChatError::BadRequest(format!("record decode failed: {e}")))
}

/// Decode a presence snapshot keyed by session id.
///
/// The map key is authoritative; a record whose `sessionId` disagrees with
/// its key is re-keyed rather than dropped.
pub fn decode_presence(value: Option<&Value>) -> BTreeMap<SessionId, PresenceEntry> {
    decode_children::<PresenceEntry>(value)
        .into_iter()
        .map(|(key, mut entry)| {
            let sid = SessionId::from_raw(key);
            if entry.session_id != sid {
                tracing::debug!(key=%sid, recorded=%entry.session_id, "presence key/sessionId mismatch");
                entry.session_id = sid.clone();
            }
            (sid, entry)
        })
        .collect()
}

/// Decode a bubble snapshot in key order (creation order for push keys).
pub fn decode_bubbles(value: Option<&Value>) -> Vec<(String, BubbleRecord)> {
    decode_children(value)
}

fn decode_children<T: DeserializeOwned>(value: Option<&Value>) -> Vec<(String, T)> {
    let Some(Value::Object(map)) = value else {
        return Vec::new();
    };
    let mut out: Vec<(String, T)> = map
        .iter()
        .filter_map(|(k, v)| match serde_json::from_value::<T>(v.clone()) {
            Ok(rec) => Some((k.clone(), rec)),
            Err(e) => {
                tracing::warn!(key=%k, error=%e, "skipping malformed record");
                None
            }
        })
        .collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}
