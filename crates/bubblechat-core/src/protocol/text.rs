//! WebSocket lane envelope (JSON).
//!
//! `data` is kept as `RawValue` so the gateway only parses the payload of
//! writes, and only once.

use serde::Deserialize;
use serde_json::value::RawValue;

/// Inbound envelope (Text frame).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Protocol version.
    pub v: u8,
    /// Service name (`"store"`).
    pub svc: String,
    /// Message type (field name is `type` in JSON): sub, unsub, read, write, delete.
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Feature flags bitmask.
    #[serde(default)]
    pub flags: u32,
    /// Client-chosen sequence number, echoed in replies.
    #[serde(default)]
    pub seq: Option<u64>,
    /// Store path the request targets.
    #[serde(default)]
    pub path: Option<String>,
    /// Optional payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub data: Option<Box<RawValue>>,
}
