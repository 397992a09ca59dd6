//! Room code normalization.
//!
//! A room code is user-typed, case-insensitive, and ends up as a store path
//! segment, so it is trimmed, upper-cased and checked for characters the
//! key tree cannot hold.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Default minimum length (in characters) of a normalized room code.
pub const MIN_ROOM_CODE_LEN: usize = 3;

/// Characters that cannot appear in a store key.
const FORBIDDEN: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// A normalized room code (trimmed, upper-case).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalize with the default minimum length.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_with_min(raw, MIN_ROOM_CODE_LEN)
    }

    pub fn parse_with_min(raw: &str, min_len: usize) -> Result<Self> {
        let code = raw.trim().to_uppercase();
        let len = code.chars().count();
        if len < min_len {
            return Err(ChatError::BadRequest(format!(
                "room code must be at least {min_len} characters"
            )));
        }
        if let Some(c) = code.chars().find(|c| FORBIDDEN.contains(c) || c.is_control()) {
            return Err(ChatError::BadRequest(format!(
                "room code contains invalid character {c:?}"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
