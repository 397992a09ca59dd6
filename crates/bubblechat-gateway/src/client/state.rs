use std::collections::HashSet;

use bubblechat_core::{ColorIdentity, RoomCode, SessionId};

use crate::chat::{Bubble, PresenceSnapshot};

/// The session's color, two-phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSelection {
    #[default]
    None,
    /// Written locally, store write in flight.
    Pending(ColorIdentity),
    /// Write acknowledged or seen in a presence snapshot.
    Confirmed(ColorIdentity),
}

impl ColorSelection {
    /// The color to render, pending or confirmed.
    pub fn color(self) -> Option<ColorIdentity> {
        match self {
            ColorSelection::None => None,
            ColorSelection::Pending(c) | ColorSelection::Confirmed(c) => Some(c),
        }
    }

    pub fn confirmed(self) -> Option<ColorIdentity> {
        match self {
            ColorSelection::Confirmed(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, ColorSelection::Pending(_))
    }
}

/// Inbound events applied to `ChatState`.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    Presence(PresenceSnapshot),
    Bubbles(Vec<Bubble>),
    /// The delayed delete of a popped bubble failed.
    PopFailed(String),
    /// The current room was deleted by someone else.
    RoomDeleted(RoomCode),
}

#[derive(Debug, Clone)]
pub struct ChatState {
    pub session: SessionId,
    pub room: Option<RoomCode>,
    pub selection: ColorSelection,
    pub presence: PresenceSnapshot,
    pub bubbles: Vec<Bubble>,
    /// Inline, non-fatal message for the view (room create/join errors).
    pub notice: Option<String>,
    popping: HashSet<String>,
}

impl ChatState {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            room: None,
            selection: ColorSelection::None,
            presence: PresenceSnapshot::default(),
            bubbles: Vec::new(),
            notice: None,
            popping: HashSet::new(),
        }
    }

    pub fn apply(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Presence(snapshot) => {
                if let ColorSelection::Pending(c) = self.selection {
                    if snapshot.color_of(&self.session) == Some(c) {
                        self.selection = ColorSelection::Confirmed(c);
                    }
                }
                self.presence = snapshot;
            }
            ChatEvent::Bubbles(list) => {
                self.popping.retain(|k| list.iter().any(|b| &b.key == k));
                self.bubbles = list
                    .into_iter()
                    .map(|mut b| {
                        b.popping = self.popping.contains(&b.key);
                        b
                    })
                    .collect();
            }
            ChatEvent::RoomDeleted(code) => {
                if self.room.as_ref() == Some(&code) {
                    self.clear_room();
                    self.notice = Some(format!("room {code} was deleted"));
                }
            }
            ChatEvent::PopFailed(key) => {
                self.popping.remove(&key);
                if let Some(b) = self.bubbles.iter_mut().find(|b| b.key == key) {
                    b.popping = false;
                }
            }
        }
    }

    /// Flag a bubble as popping. False if unknown or already popping.
    pub fn mark_popping(&mut self, key: &str) -> bool {
        let Some(b) = self.bubbles.iter_mut().find(|b| b.key == key) else {
            return false;
        };
        if b.popping {
            return false;
        }
        b.popping = true;
        self.popping.insert(key.to_string());
        true
    }

    pub fn bubble(&self, key: &str) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.key == key)
    }

    /// Colors selectable by this session given the last snapshot.
    pub fn available_colors(&self) -> Vec<ColorIdentity> {
        self.presence.available_colors(&self.session)
    }

    /// Drop everything tied to the current room.
    pub(crate) fn clear_room(&mut self) {
        self.room = None;
        self.selection = ColorSelection::None;
        self.presence = PresenceSnapshot::default();
        self.bubbles.clear();
        self.popping.clear();
    }
}
