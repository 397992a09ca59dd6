//! Store paths.
//!
//! Layout:
//! ```text
//! rooms/{roomCode}/roomInfo
//! rooms/{roomCode}/activeUsers/{sessionId}
//! rooms/{roomCode}/bubbles/{bubbleKey}
//! ```

use std::fmt;

use crate::error::{ChatError, Result};
use crate::room::RoomCode;
use crate::session::SessionId;

pub const ROOMS: &str = "rooms";
pub const ROOM_INFO: &str = "roomInfo";
pub const ACTIVE_USERS: &str = "activeUsers";
pub const BUBBLES: &str = "bubbles";

/// A slash-separated path into the key tree. The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse untrusted input (gateway requests). Empty segments are ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for seg in raw.split('/').filter(|s| !s.is_empty()) {
            if let Some(c) = seg
                .chars()
                .find(|c| matches!(c, '.' | '$' | '#' | '[' | ']') || c.is_control())
            {
                return Err(ChatError::BadRequest(format!(
                    "invalid character {c:?} in path segment {seg:?}"
                )));
            }
            segments.push(seg.to_string());
        }
        Ok(Self { segments })
    }

    /// Append one key. Callers pass keys that are already valid segments
    /// (room codes, session ids, push keys).
    pub fn child(&self, key: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.as_ref().to_string());
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, if any.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_ancestor_or_self_of(&self, other: &StorePath) -> bool {
        other.segments.len() >= self.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| a == b)
    }

    /// A change at `self` is visible at `other` (or vice versa).
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self.is_ancestor_or_self_of(other) || other.is_ancestor_or_self_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

pub fn rooms() -> StorePath {
    StorePath::root().child(ROOMS)
}

pub fn room(code: &RoomCode) -> StorePath {
    rooms().child(code)
}

pub fn room_info(code: &RoomCode) -> StorePath {
    room(code).child(ROOM_INFO)
}

pub fn active_users(code: &RoomCode) -> StorePath {
    room(code).child(ACTIVE_USERS)
}

pub fn active_user(code: &RoomCode, session: &SessionId) -> StorePath {
    active_users(code).child(session.as_str())
}

pub fn bubbles(code: &RoomCode) -> StorePath {
    room(code).child(BUBBLES)
}

pub fn bubble(code: &RoomCode, key: &str) -> StorePath {
    bubbles(code).child(key)
}
