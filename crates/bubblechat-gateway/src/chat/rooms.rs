use std::sync::Arc;

use bubblechat_core::error::{ChatError, Result};
use bubblechat_core::protocol::paths;
use bubblechat_core::protocol::records::{decode, encode, RoomInfo};
use bubblechat_core::{RoomCode, SessionId};

use crate::store::{RealtimeStore, Subscription};

/// Live view of `rooms/{code}/roomInfo`, used to notice a room being deleted
/// under its members.
pub struct RoomWatch {
    inner: Subscription,
}

impl RoomWatch {
    /// Resolves once the room info is gone. `None` if the store side went
    /// away first. Cancel-safe.
    pub async fn deleted(&mut self) -> Option<()> {
        loop {
            if self.inner.next().await?.is_none() {
                return Some(());
            }
        }
    }

    pub fn unsubscribe(self) {
        self.inner.unsubscribe();
    }
}

/// Room lifecycle on top of `rooms/{code}`.
pub struct RoomDirectory {
    store: Arc<dyn RealtimeStore>,
    min_code_len: usize,
}

impl RoomDirectory {
    pub fn new(store: Arc<dyn RealtimeStore>, min_code_len: usize) -> Self {
        Self { store, min_code_len }
    }

    pub fn normalize(&self, raw: &str) -> Result<RoomCode> {
        RoomCode::parse_with_min(raw, self.min_code_len)
    }

    pub async fn exists(&self, code: &RoomCode) -> Result<bool> {
        Ok(self.store.read_once(&paths::room(code)).await?.is_some())
    }

    /// Create a room if nothing lives at its root yet.
    ///
    /// The existence check and the write are two store calls: two clients
    /// creating the same code inside that window both succeed and the later
    /// `roomInfo` overwrites the earlier one.
    pub async fn create_room(&self, raw: &str, created_by: &SessionId) -> Result<RoomCode> {
        let code = self.normalize(raw)?;
        if self.exists(&code).await? {
            return Err(ChatError::AlreadyExists(code.to_string()));
        }
        let info = encode(&RoomInfo::new(&code, created_by))?;
        self.store.write(&paths::room_info(&code), info).await?;
        tracing::info!(room = %code, created_by = %created_by, "room created");
        Ok(code)
    }

    pub async fn join_room(&self, raw: &str) -> Result<RoomCode> {
        let code = self.normalize(raw)?;
        if !self.exists(&code).await? {
            return Err(ChatError::NotFound(code.to_string()));
        }
        tracing::debug!(room = %code, "room joined");
        Ok(code)
    }

    /// Recursively delete room info, presence and bubbles. Irreversible.
    pub async fn delete_room(&self, raw: &str) -> Result<()> {
        let code = self.normalize(raw)?;
        self.store.delete(&paths::room(&code)).await?;
        tracing::info!(room = %code, "room deleted");
        Ok(())
    }

    /// Create unless it already exists.
    pub async fn ensure_room(&self, raw: &str, created_by: &SessionId) -> Result<RoomCode> {
        match self.create_room(raw, created_by).await {
            Ok(code) => Ok(code),
            Err(ChatError::AlreadyExists(_)) => self.normalize(raw),
            Err(e) => Err(e),
        }
    }

    pub async fn watch(&self, code: &RoomCode) -> Result<RoomWatch> {
        let inner = self.store.subscribe(&paths::room_info(code)).await?;
        Ok(RoomWatch { inner })
    }

    pub async fn room_info(&self, code: &RoomCode) -> Result<Option<RoomInfo>> {
        match self.store.read_once(&paths::room_info(code)).await? {
            Some(v) => Ok(Some(decode(v)?)),
            None => Ok(None),
        }
    }
}
