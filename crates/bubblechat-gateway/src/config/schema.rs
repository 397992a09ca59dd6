use serde::Deserialize;

use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::RoomCode;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub chat: ChatSection,
}

impl ChatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ChatError::UnsupportedVersion);
        }
        self.gateway.validate()?;
        self.chat.validate()?;
        Ok(())
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            chat: ChatSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(ChatError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(ChatError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(ChatError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(256..=1_048_576).contains(&self.max_frame_bytes) {
            return Err(ChatError::BadRequest(
                "gateway.max_frame_bytes must be between 256 and 1048576".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    16384
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSection {
    #[serde(default = "default_min_room_code_len")]
    pub min_room_code_len: usize,

    /// Delay between a pop request and the store delete (exit animation).
    #[serde(default = "default_pop_delay_ms")]
    pub pop_delay_ms: u64,

    /// Horizontal spread of new bubbles, in percent of the view width.
    #[serde(default = "default_bubble_x_min")]
    pub bubble_x_min: f64,
    #[serde(default = "default_bubble_x_max")]
    pub bubble_x_max: f64,

    /// Rooms created at boot if missing.
    #[serde(default)]
    pub preset_rooms: Vec<String>,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            min_room_code_len: default_min_room_code_len(),
            pop_delay_ms: default_pop_delay_ms(),
            bubble_x_min: default_bubble_x_min(),
            bubble_x_max: default_bubble_x_max(),
            preset_rooms: Vec::new(),
        }
    }
}

impl ChatSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=64).contains(&self.min_room_code_len) {
            return Err(ChatError::BadRequest(
                "chat.min_room_code_len must be between 1 and 64".into(),
            ));
        }
        if self.pop_delay_ms > 10000 {
            return Err(ChatError::BadRequest(
                "chat.pop_delay_ms must be at most 10000".into(),
            ));
        }
        let range_ok = self.bubble_x_min >= 0.0
            && self.bubble_x_max <= 100.0
            && self.bubble_x_min < self.bubble_x_max;
        if !range_ok {
            return Err(ChatError::BadRequest(
                "chat.bubble_x_min/bubble_x_max must satisfy 0 <= min < max <= 100".into(),
            ));
        }
        for raw in &self.preset_rooms {
            RoomCode::parse_with_min(raw, self.min_room_code_len).map_err(|e| {
                ChatError::BadRequest(format!("chat.preset_rooms entry {raw:?}: {e}"))
            })?;
        }
        Ok(())
    }
}

fn default_min_room_code_len() -> usize {
    3
}
fn default_pop_delay_ms() -> u64 {
    300
}
fn default_bubble_x_min() -> f64 {
    10.0
}
fn default_bubble_x_max() -> f64 {
    90.0
}
