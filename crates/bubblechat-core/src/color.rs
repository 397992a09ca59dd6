//! The five color identities a session can hold in a room.
//!
//! A color is both the avatar of a participant and the room-wide
//! mutual-exclusion token. Each color also carries the legacy user tag
//! (`user1`..`user5`) that is written next to it in presence and bubble
//! records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorIdentity {
    Pink,
    Blue,
    Green,
    Purple,
    Yellow,
}

impl ColorIdentity {
    /// Every color, in picker order.
    pub const ALL: [ColorIdentity; 5] = [
        ColorIdentity::Pink,
        ColorIdentity::Blue,
        ColorIdentity::Green,
        ColorIdentity::Purple,
        ColorIdentity::Yellow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ColorIdentity::Pink => "pink",
            ColorIdentity::Blue => "blue",
            ColorIdentity::Green => "green",
            ColorIdentity::Purple => "purple",
            ColorIdentity::Yellow => "yellow",
        }
    }

    /// User tag stored in the `user` field of records.
    pub fn user_tag(self) -> &'static str {
        match self {
            ColorIdentity::Pink => "user1",
            ColorIdentity::Blue => "user2",
            ColorIdentity::Green => "user3",
            ColorIdentity::Purple => "user4",
            ColorIdentity::Yellow => "user5",
        }
    }

    /// Reverse of [`ColorIdentity::user_tag`].
    pub fn from_user_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.user_tag() == tag)
    }
}

impl fmt::Display for ColorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorIdentity {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.user_tag() == s)
            .ok_or_else(|| ChatError::BadRequest(format!("unknown color: {s}")))
    }
}
