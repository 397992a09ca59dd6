use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::protocol::paths;
use bubblechat_core::protocol::records::{decode_presence, encode, PresenceEntry};
use bubblechat_core::{ColorIdentity, RoomCode, SessionId};

use crate::store::{RealtimeStore, Subscription};

/// Last known presence mapping of one room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
    entries: BTreeMap<SessionId, PresenceEntry>,
}

impl PresenceSnapshot {
    pub fn from_value(value: Option<&Value>) -> Self {
        Self {
            entries: decode_presence(value),
        }
    }

    pub fn entries(&self) -> &BTreeMap<SessionId, PresenceEntry> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, session: &SessionId) -> Option<&PresenceEntry> {
        self.entries.get(session)
    }

    pub fn color_of(&self, session: &SessionId) -> Option<ColorIdentity> {
        self.entries.get(session).map(|e| e.color)
    }

    /// Whether a session other than `me` holds `color`.
    pub fn is_taken(&self, color: ColorIdentity, me: &SessionId) -> bool {
        self.entries
            .iter()
            .any(|(sid, e)| e.color == color && sid != me)
    }

    /// Colors `me` could pick right now (its own color included).
    pub fn available_colors(&self, me: &SessionId) -> Vec<ColorIdentity> {
        ColorIdentity::ALL
            .into_iter()
            .filter(|c| !self.is_taken(*c, me))
            .collect()
    }

    /// Colors held by more than one session: leftovers of a lost
    /// check-then-write race.
    pub fn conflicts(&self) -> Vec<ColorIdentity> {
        ColorIdentity::ALL
            .into_iter()
            .filter(|c| self.entries.values().filter(|e| e.color == *c).count() > 1)
            .collect()
    }
}

pub struct PresenceSubscription {
    inner: Subscription,
}

impl PresenceSubscription {
    pub async fn next(&mut self) -> Option<PresenceSnapshot> {
        let value = self.inner.next().await?;
        Some(PresenceSnapshot::from_value(value.as_ref()))
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}

/// Writes and streams `rooms/{code}/activeUsers`.
///
/// Exclusivity is checked against the caller's last streamed snapshot, then
/// written without any store-side guard. Two sessions claiming the same free
/// color inside one round trip can both win; the snapshot then shows the
/// conflict until one of them moves.
pub struct PresenceRegistry {
    store: Arc<dyn RealtimeStore>,
}

impl PresenceRegistry {
    pub fn new(store: Arc<dyn RealtimeStore>) -> Self {
        Self { store }
    }

    /// Fails with `ColorTaken` when another session holds `color`.
    pub fn ensure_free(snapshot: &PresenceSnapshot, session: &SessionId, color: ColorIdentity) -> Result<()> {
        if snapshot.is_taken(color, session) {
            return Err(ChatError::ColorTaken(color));
        }
        Ok(())
    }

    pub async fn claim_color(
        &self,
        room: &RoomCode,
        session: &SessionId,
        color: ColorIdentity,
        snapshot: &PresenceSnapshot,
    ) -> Result<()> {
        Self::ensure_free(snapshot, session, color)?;
        let entry = encode(&PresenceEntry::new(session, color))?;
        self.store.write(&paths::active_user(room, session), entry).await?;
        tracing::info!(room = %room, session = %session, color = %color, "color claimed");
        Ok(())
    }

    /// Same as `claim_color`, overwriting the session's entry in place.
    /// `NoOp` without any write when `new` is already the current color.
    pub async fn change_color(
        &self,
        room: &RoomCode,
        session: &SessionId,
        current: Option<ColorIdentity>,
        new: ColorIdentity,
        snapshot: &PresenceSnapshot,
    ) -> Result<()> {
        if current == Some(new) {
            return Err(ChatError::NoOp);
        }
        self.claim_color(room, session, new, snapshot).await
    }

    pub async fn leave(&self, room: &RoomCode, session: &SessionId) -> Result<()> {
        self.store.delete(&paths::active_user(room, session)).await?;
        tracing::info!(room = %room, session = %session, "presence removed");
        Ok(())
    }

    /// Unload hook: fire-and-forget removal, not guaranteed to land.
    pub fn leave_on_unload(&self, room: &RoomCode, session: &SessionId) {
        self.store.beacon_delete(&paths::active_user(room, session));
    }

    pub async fn subscribe(&self, room: &RoomCode) -> Result<PresenceSubscription> {
        let inner = self.store.subscribe(&paths::active_users(room)).await?;
        Ok(PresenceSubscription { inner })
    }
}
