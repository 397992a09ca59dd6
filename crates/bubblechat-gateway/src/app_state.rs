//! Shared application state for the bubblechat gateway.
//!
//! Owns the validated config, the store every connection talks to, and the
//! metrics registry. Startup errors are returned, not panicked.

use std::sync::Arc;

use bubblechat_core::error::Result;
use bubblechat_core::SessionId;

use crate::chat::RoomDirectory;
use crate::client::ChatClient;
use crate::config::ChatConfig;
use crate::obs::ChatMetrics;
use crate::store::{MemoryStore, RealtimeStore};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: ChatConfig,
    store: Arc<dyn RealtimeStore>,
    metrics: Arc<ChatMetrics>,
    /// Identity used as `createdBy` for rooms seeded at boot.
    boot_session: SessionId,
}

impl AppState {
    /// Build state around a fresh in-memory store.
    pub fn new(cfg: ChatConfig) -> Result<Self> {
        cfg.validate()?;
        let metrics = Arc::new(ChatMetrics::default());
        let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new(Arc::clone(&metrics)));
        Ok(Self::with_store(cfg, store, metrics))
    }

    pub fn with_store(cfg: ChatConfig, store: Arc<dyn RealtimeStore>, metrics: Arc<ChatMetrics>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                metrics,
                boot_session: SessionId::generate(),
            }),
        }
    }

    /// Create every configured preset room that does not exist yet.
    pub async fn seed_preset_rooms(&self) -> Result<usize> {
        let chat = &self.inner.cfg.chat;
        let dir = RoomDirectory::new(self.store(), chat.min_room_code_len);
        for raw in &chat.preset_rooms {
            let code = dir.ensure_room(raw, &self.inner.boot_session).await?;
            tracing::info!(room = %code, "preset room ready");
        }
        Ok(chat.preset_rooms.len())
    }

    pub fn cfg(&self) -> &ChatConfig {
        &self.inner.cfg
    }

    pub fn store(&self) -> Arc<dyn RealtimeStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn metrics(&self) -> Arc<ChatMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    /// An in-process client bound to this gateway's store.
    pub fn chat_client(&self) -> ChatClient {
        ChatClient::new(self.store(), &self.inner.cfg.chat)
    }
}
